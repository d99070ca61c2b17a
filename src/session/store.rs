use crate::session::{ChatSession, SCHEMA_VERSION};
use std::ffi::OsStr;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct SessionStore {
    dir: PathBuf,
}

impl SessionStore {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn default_location() -> Self {
        let home = dirs::home_dir().unwrap_or_else(|| PathBuf::from("."));
        Self::new(home.join(".docpilot").join("sessions"))
    }

    #[cfg(test)]
    pub fn dir(&self) -> &Path {
        &self.dir
    }

    fn session_path(&self, session_id: &str) -> PathBuf {
        self.dir.join(format!("{session_id}.json"))
    }

    fn ensure_dir(&self) -> io::Result<()> {
        fs::create_dir_all(&self.dir)
    }

    pub fn save(&self, session: &ChatSession) -> io::Result<()> {
        self.ensure_dir()?;
        let final_path = self.session_path(&session.session_id);
        let tmp_path = self.dir.join(format!("{}.json.tmp", session.session_id));
        let bytes = serde_json::to_vec_pretty(session)
            .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err.to_string()))?;

        fs::write(&tmp_path, bytes)?;
        match fs::rename(&tmp_path, &final_path) {
            Ok(()) => Ok(()),
            Err(rename_err) => {
                if final_path.exists() {
                    fs::remove_file(&final_path)?;
                    fs::rename(&tmp_path, &final_path)?;
                    Ok(())
                } else {
                    Err(rename_err)
                }
            }
        }
    }

    pub fn load_all(&self) -> (Vec<ChatSession>, Vec<String>) {
        let mut sessions = Vec::new();
        let mut warnings = Vec::new();

        if let Err(err) = self.ensure_dir() {
            warnings.push(format!("failed to initialize sessions directory: {err}"));
            return (sessions, warnings);
        }

        let entries = match fs::read_dir(&self.dir) {
            Ok(entries) => entries,
            Err(err) => {
                warnings.push(format!("failed to read sessions directory: {err}"));
                return (sessions, warnings);
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension() != Some(OsStr::new("json")) {
                continue;
            }
            match read_session_file(&path) {
                Ok(session) => sessions.push(session),
                Err(err) => warnings.push(err),
            }
        }

        sessions.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        (sessions, warnings)
    }

    pub fn load_one(&self, session_id: &str) -> (Option<ChatSession>, Option<String>) {
        let path = self.session_path(session_id);
        if !path.exists() {
            return (
                None,
                Some(format!(
                    "session file missing for id {session_id}: {}",
                    path.display()
                )),
            );
        }

        match read_session_file(&path) {
            Ok(session) => (Some(session), None),
            Err(err) => (None, Some(err)),
        }
    }
}

fn read_session_file(path: &Path) -> Result<ChatSession, String> {
    let data = fs::read(path).map_err(|err| format!("failed to read {}: {err}", path.display()))?;
    let session: ChatSession = serde_json::from_slice(&data)
        .map_err(|err| format!("failed to parse {}: {err}", path.display()))?;
    if session.schema_version != SCHEMA_VERSION {
        return Err(format!(
            "unknown schema_version in {}: {}",
            path.display(),
            session.schema_version
        ));
    }
    Ok(session)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::chat::message::{ConversationMessage, IssueDraft, MessageKind};

    fn store() -> (tempfile::TempDir, SessionStore) {
        let dir = tempfile::tempdir().expect("temp dir should be created");
        let store = SessionStore::new(dir.path().join("sessions"));
        (dir, store)
    }

    #[test]
    fn save_then_load_keeps_messages_and_drafts() {
        let (_dir, store) = store();
        let mut session = ChatSession::new("100");
        let mut draft = ConversationMessage::draft(
            IssueDraft {
                summary: Some("Audit log".into()),
                ..IssueDraft::default()
            },
            "OPS",
        );
        draft.submitted = true;
        session.record(
            Some("OPS"),
            &[
                ConversationMessage::user(MessageKind::Compose, "Add audit log", Some("OPS".into())),
                draft,
            ],
        );

        store.save(&session).expect("session should save");
        let (loaded, warning) = store.load_one(&session.session_id);
        assert!(warning.is_none());
        assert_eq!(loaded, Some(session));
    }

    #[test]
    fn load_all_sorts_newest_first_and_reports_bad_files() {
        let (_dir, store) = store();
        let older = ChatSession::new("100");
        let newer = ChatSession::new("200");
        store.save(&older).expect("older should save");
        store.save(&newer).expect("newer should save");
        fs::write(store.dir().join("broken.json"), "{").expect("fixture should write");
        fs::write(store.dir().join("notes.txt"), "ignored").expect("fixture should write");

        let (sessions, warnings) = store.load_all();
        let created: Vec<&str> = sessions.iter().map(|s| s.created_at.as_str()).collect();
        assert_eq!(created, vec!["200", "100"]);
        assert_eq!(warnings.len(), 1);
        assert!(warnings[0].contains("failed to parse"));
    }

    #[test]
    fn unknown_schema_version_is_rejected() {
        let (_dir, store) = store();
        fs::create_dir_all(store.dir()).expect("dir should be created");
        fs::write(
            store.dir().join("future.json"),
            r#"{"schema_version": 99, "session_id": "future", "created_at": "1", "messages": []}"#,
        )
        .expect("fixture should write");

        let (session, warning) = store.load_one("future");
        assert!(session.is_none());
        assert!(warning.is_some_and(|warning| warning.contains("unknown schema_version")));
    }

    #[test]
    fn missing_session_is_a_warning() {
        let (_dir, store) = store();
        let (session, warning) = store.load_one("nope");
        assert!(session.is_none());
        assert!(warning.is_some());
    }
}
