use std::{
    collections::HashSet,
    fs,
    io::{self, Write},
    path::{Path, PathBuf},
    sync::{Mutex, PoisonError},
};

use log::{debug, error, info, trace, warn};
use tempfile::Builder;

use crate::{next_id, MemoError, Note, Result, Validator, WriteFailure};

/// How the store file looked when it was read.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadStatus {
    /// No file yet; a legitimate first-run state.
    Missing,
    /// File read and decoded.
    Loaded,
    /// File exists but is not a valid note array.
    Corrupt(String),
    /// File exists but could not be read at all.
    Unreadable(String),
}

/// The collection produced by one load, plus how it was obtained.
#[derive(Debug, Clone)]
pub struct Snapshot {
    pub notes: Vec<Note>,
    pub status: LoadStatus,
}

impl Snapshot {
    fn empty(status: LoadStatus) -> Self {
        Snapshot {
            notes: Vec::new(),
            status,
        }
    }

    /// Only a missing or cleanly decoded file may be overwritten.
    pub fn is_writable(&self) -> bool {
        matches!(self.status, LoadStatus::Missing | LoadStatus::Loaded)
    }

    /// User-facing note about data that could not be read, if any.
    pub fn warning(&self) -> Option<String> {
        match &self.status {
            LoadStatus::Corrupt(reason) => Some(format!(
                "the notes file is damaged and was treated as empty ({reason})"
            )),
            LoadStatus::Unreadable(reason) => Some(format!(
                "the notes file could not be read and was treated as empty ({reason})"
            )),
            LoadStatus::Missing | LoadStatus::Loaded => None,
        }
    }
}

/// Result of an update request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UpdateOutcome {
    Updated(Note),
    /// Neither a title nor a body was supplied; nothing was read or written.
    NothingRequested,
    NotFound,
}

/// Result of a delete request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted { removed: Note, remaining: usize },
    NotFound,
}

/// Handle to the JSON file holding the note collection.
///
/// Every operation reads the whole file and mutations write the whole file
/// back. Mutations issued through the same handle are serialized; separate
/// processes writing the same file still race and the last save wins.
pub struct NoteStore {
    /// Location of the notes file
    path: PathBuf,

    /// Field limits applied before any mutation
    validator: Validator,

    /// Held for the whole load/mutate/save sequence
    write_lock: Mutex<()>,
}

impl NoteStore {
    pub fn new(path: impl Into<PathBuf>, validator: Validator) -> Self {
        Self {
            path: path.into(),
            validator,
            write_lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn validator(&self) -> &Validator {
        &self.validator
    }

    /// Reads the whole collection.
    ///
    /// Never fails: a missing file is an empty store, and a damaged or
    /// unreadable file degrades to an empty collection whose status says so.
    pub fn load(&self) -> Snapshot {
        debug!("Loading notes from {}", self.path.display());

        let raw = match fs::read_to_string(&self.path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                debug!("Notes file does not exist yet: {}", self.path.display());
                return Snapshot::empty(LoadStatus::Missing);
            }
            Err(e) => {
                warn!("Failed to read notes file {}: {}", self.path.display(), e);
                return Snapshot::empty(LoadStatus::Unreadable(e.to_string()));
            }
        };

        if raw.trim().is_empty() {
            trace!("Notes file is empty");
            return Snapshot::empty(LoadStatus::Loaded);
        }

        match serde_json::from_str::<Option<Vec<Note>>>(&raw) {
            Ok(notes) => {
                let notes = notes.unwrap_or_default();
                warn_on_duplicate_ids(&notes);
                debug!("Loaded {} notes", notes.len());
                Snapshot {
                    notes,
                    status: LoadStatus::Loaded,
                }
            }
            Err(e) => {
                warn!("Notes file {} is not valid JSON: {}", self.path.display(), e);
                Snapshot::empty(LoadStatus::Corrupt(e.to_string()))
            }
        }
    }

    /// Writes the whole collection atomically.
    ///
    /// The JSON goes to a temporary file in the same directory which is then
    /// renamed over the notes file, so readers see either the old or the new
    /// contents. The temporary file never outlives this call.
    pub fn save(&self, notes: &[Note]) -> Result<()> {
        self.save_with(notes, |_| Ok(()))
    }

    fn save_with<F>(&self, notes: &[Note], before_persist: F) -> Result<()>
    where
        F: FnOnce(&Path) -> io::Result<()>,
    {
        info!("Saving {} notes to {}", notes.len(), self.path.display());

        let dir = match self.path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };

        if !dir.exists() {
            debug!("Creating parent directory: {}", dir.display());
            fs::create_dir_all(dir).map_err(|e| {
                error!("Failed to create directory {}: {}", dir.display(), e);
                write_error(dir, e)
            })?;
        }

        trace!("Serializing notes to JSON");
        let mut json = serde_json::to_string_pretty(notes).map_err(|e| {
            error!("Failed to serialize notes: {}", e);
            MemoError::Serialization(e)
        })?;
        json.push('\n');

        debug!("Creating temporary file in directory: {}", dir.display());
        let mut temp_file = Builder::new()
            .prefix(".notes.")
            .suffix(".tmp")
            .tempfile_in(dir)
            .map_err(|e| {
                error!("Failed to create temporary file: {}", e);
                write_error(dir, e)
            })?;

        let temp_path = temp_file.path().to_path_buf();
        trace!("Writing to temporary file");
        temp_file.write_all(json.as_bytes()).map_err(|e| {
            error!("Failed to write to temporary file: {}", e);
            write_error(&temp_path, e)
        })?;

        temp_file.flush().map_err(|e| {
            error!("Failed to flush temporary file: {}", e);
            write_error(&temp_path, e)
        })?;

        temp_file.as_file().sync_all().map_err(|e| {
            error!("Failed to sync temporary file: {}", e);
            write_error(&temp_path, e)
        })?;

        before_persist(temp_file.path()).map_err(|e| write_error(&self.path, e))?;

        debug!("Performing atomic move of temporary file to final location");
        temp_file.persist(&self.path).map_err(|e| {
            error!("Failed to persist file {}: {}", self.path.display(), e.error);
            write_error(&self.path, e.error)
        })?;

        Ok(())
    }

    /// Loads the collection for a mutation, refusing files we could not read.
    fn load_for_write(&self) -> Result<Vec<Note>> {
        let snapshot = self.load();
        let reason = match snapshot.status {
            LoadStatus::Missing | LoadStatus::Loaded => return Ok(snapshot.notes),
            LoadStatus::Corrupt(reason) => format!("the file is damaged ({reason})"),
            LoadStatus::Unreadable(reason) => format!("the file cannot be read ({reason})"),
        };
        error!("Blocking write to {}: {}", self.path.display(), reason);
        Err(MemoError::StoreNotWritable {
            path: self.path.clone(),
            reason,
        })
    }

    /// Validates the fields and appends a new note.
    pub fn add(&self, title: &str, body: Option<&str>) -> Result<Note> {
        let title = self.validator.validate_title(title)?;
        let body = self.validator.validate_body(body)?;

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut notes = self.load_for_write()?;

        let id = next_id(&notes).ok_or_else(|| {
            error!("No id left after #{} in {}", u64::MAX, self.path.display());
            MemoError::IdsExhausted
        })?;
        let note = Note::new(id, title, body);
        notes.push(note.clone());
        self.save(&notes)?;

        info!("Note #{} created", note.id);
        Ok(note)
    }

    /// Replaces the supplied fields of note `id` and stamps `updated_at`.
    pub fn update(&self, id: u64, title: Option<&str>, body: Option<&str>) -> Result<UpdateOutcome> {
        if title.is_none() && body.is_none() {
            debug!("Update of #{} requested no changes", id);
            return Ok(UpdateOutcome::NothingRequested);
        }

        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut notes = self.load_for_write()?;

        let Some(note) = notes.iter_mut().find(|n| n.id == id) else {
            debug!("Cannot update note #{}: not found", id);
            return Ok(UpdateOutcome::NotFound);
        };

        if let Some(title) = title {
            note.title = self.validator.validate_title(title)?;
        }
        if let Some(body) = body {
            note.body = self.validator.validate_body(Some(body))?;
        }
        note.touch();
        let updated = note.clone();

        self.save(&notes)?;
        info!("Note #{} updated", id);
        Ok(UpdateOutcome::Updated(updated))
    }

    /// Removes note `id`; the file is left untouched when it does not exist.
    pub fn delete(&self, id: u64) -> Result<DeleteOutcome> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let mut notes = self.load_for_write()?;

        let Some(index) = notes.iter().position(|n| n.id == id) else {
            debug!("Cannot delete note #{}: not found", id);
            return Ok(DeleteOutcome::NotFound);
        };

        let removed = notes.remove(index);
        self.save(&notes)?;

        info!("Note #{} deleted, {} remaining", id, notes.len());
        Ok(DeleteOutcome::Deleted {
            removed,
            remaining: notes.len(),
        })
    }

    /// Looks up a single note by id.
    pub fn get(&self, id: u64) -> Option<Note> {
        self.load().notes.into_iter().find(|n| n.id == id)
    }
}

fn write_error(path: &Path, source: io::Error) -> MemoError {
    MemoError::StorageWrite {
        kind: WriteFailure::from_io(&source),
        path: path.to_path_buf(),
        source,
    }
}

fn warn_on_duplicate_ids(notes: &[Note]) {
    let mut seen = HashSet::with_capacity(notes.len());
    for note in notes {
        if !seen.insert(note.id) {
            warn!("Notes file contains duplicate id #{}", note.id);
        }
    }
}
