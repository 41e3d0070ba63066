use crate::constants::SAVE_VERSION_MAGIC;
use crate::patient::PatientSnapshot;
use bincode;
use directories::ProjectDirs;
use sha2::{Digest, Sha256};
use std::fs;
use std::io::{self, Read, Write};
use std::path::PathBuf;

/// Persists patient snapshots in a checksummed binary format.
pub struct SaveManager {
    save_path: PathBuf,
}

impl SaveManager {
    /// Creates a new SaveManager instance.
    ///
    /// Sets up the save directory at the appropriate location for the
    /// platform using the `directories` crate.
    pub fn new() -> io::Result<Self> {
        let project_dirs = ProjectDirs::from("", "", "clinic").ok_or_else(|| {
            io::Error::new(io::ErrorKind::NotFound, "Could not determine config directory")
        })?;

        let config_dir = project_dirs.config_dir();
        fs::create_dir_all(config_dir)?;

        let save_path = config_dir.join("patient.dat");

        Ok(Self { save_path })
    }

    /// Creates a SaveManager writing to an explicit path. Used by tests.
    pub fn with_path(save_path: PathBuf) -> Self {
        Self { save_path }
    }

    /// Saves a patient snapshot to disk with checksum verification.
    ///
    /// File format:
    /// - Version magic (8 bytes)
    /// - Data length (4 bytes)
    /// - Serialized snapshot (variable length)
    /// - SHA256 checksum (32 bytes)
    pub fn save(&self, snapshot: &PatientSnapshot) -> io::Result<()> {
        let data = bincode::serialize(snapshot)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        let data_len = data.len() as u32;

        // Checksum covers version + length + data.
        let mut hasher = Sha256::new();
        hasher.update(&SAVE_VERSION_MAGIC.to_le_bytes());
        hasher.update(&data_len.to_le_bytes());
        hasher.update(&data);
        let checksum = hasher.finalize();

        let mut file = fs::File::create(&self.save_path)?;
        file.write_all(&SAVE_VERSION_MAGIC.to_le_bytes())?;
        file.write_all(&data_len.to_le_bytes())?;
        file.write_all(&data)?;
        file.write_all(&checksum)?;

        Ok(())
    }

    /// Loads a patient snapshot from disk with checksum verification.
    ///
    /// Returns an error if:
    /// - The file doesn't exist
    /// - The version magic is incorrect
    /// - The checksum verification fails
    /// - The data cannot be deserialized
    pub fn load(&self) -> io::Result<PatientSnapshot> {
        let mut file = fs::File::open(&self.save_path)?;

        let mut version_bytes = [0u8; 8];
        file.read_exact(&mut version_bytes)?;
        let version = u64::from_le_bytes(version_bytes);

        if version != SAVE_VERSION_MAGIC {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                format!(
                    "Invalid save version: expected 0x{:016X}, got 0x{:016X}",
                    SAVE_VERSION_MAGIC, version
                ),
            ));
        }

        let mut length_bytes = [0u8; 4];
        file.read_exact(&mut length_bytes)?;
        let data_len = u32::from_le_bytes(length_bytes);

        let mut data = vec![0u8; data_len as usize];
        file.read_exact(&mut data)?;

        let mut stored_checksum = [0u8; 32];
        file.read_exact(&mut stored_checksum)?;

        let mut hasher = Sha256::new();
        hasher.update(&version_bytes);
        hasher.update(&length_bytes);
        hasher.update(&data);
        let computed_checksum = hasher.finalize();

        if stored_checksum != computed_checksum.as_slice() {
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "Checksum verification failed",
            ));
        }

        let snapshot = bincode::deserialize(&data)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;

        Ok(snapshot)
    }

    /// Checks if a save file exists.
    pub fn save_exists(&self) -> bool {
        self.save_path.exists()
    }

    /// Removes the save file if present.
    pub fn delete_save(&self) -> io::Result<()> {
        if self.save_path.exists() {
            fs::remove_file(&self.save_path)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{NeedCode, NeedDefinition};
    use crate::patient::{Patient, NAME_POOL};
    use rand::SeedableRng;
    use rand_chacha::ChaCha8Rng;
    use tempfile::TempDir;

    fn manager_in(dir: &TempDir) -> SaveManager {
        SaveManager::with_path(dir.path().join("patient.dat"))
    }

    fn populated_snapshot() -> crate::patient::PatientSnapshot {
        let mut rng = ChaCha8Rng::seed_from_u64(99);
        let catalog: Vec<NeedDefinition> = ['A', 'B', 'C', 'D', 'E']
            .iter()
            .map(|&c| NeedDefinition {
                code: NeedCode(c),
                label: format!("need {}", c),
                greeting_text: String::new(),
            })
            .collect();

        let mut patient = Patient::new();
        patient.assign_identity(&NAME_POOL, &mut rng);
        patient.assign_constitution(&mut rng);
        patient.initialize_needs(&catalog, &mut rng).unwrap();
        patient.increase_toxicity(17.25);
        patient.snapshot()
    }

    #[test]
    fn test_save_and_load() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let manager = manager_in(&dir);
        let original = populated_snapshot();

        manager.save(&original).expect("Failed to save snapshot");
        assert!(manager.save_exists());

        let loaded = manager.load().expect("Failed to load snapshot");
        assert_eq!(loaded.id, original.id);
        assert_eq!(loaded.name, original.name);
        assert_eq!(loaded.constitution, original.constitution);
        assert_eq!(loaded.needs, original.needs);
        assert_eq!(loaded.toxicity_level, original.toxicity_level);
        assert_eq!(loaded.alive, original.alive);
    }

    #[test]
    fn test_load_nonexistent() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let manager = manager_in(&dir);

        let result = manager.load();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::NotFound);
    }

    #[test]
    fn test_load_rejects_wrong_magic() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let manager = manager_in(&dir);
        manager.save(&populated_snapshot()).expect("Failed to save");

        let path = dir.path().join("patient.dat");
        let mut bytes = fs::read(&path).expect("Failed to read save file");
        bytes[0] ^= 0xFF;
        fs::write(&path, &bytes).expect("Failed to rewrite save file");

        let result = manager.load();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_load_rejects_corrupted_payload() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let manager = manager_in(&dir);
        manager.save(&populated_snapshot()).expect("Failed to save");

        let path = dir.path().join("patient.dat");
        let mut bytes = fs::read(&path).expect("Failed to read save file");
        let mid = bytes.len() / 2;
        bytes[mid] ^= 0xFF;
        fs::write(&path, &bytes).expect("Failed to rewrite save file");

        let result = manager.load();
        assert!(result.is_err());
        assert_eq!(result.unwrap_err().kind(), io::ErrorKind::InvalidData);
    }

    #[test]
    fn test_delete_save() {
        let dir = TempDir::new().expect("Failed to create temp dir");
        let manager = manager_in(&dir);
        manager.save(&populated_snapshot()).expect("Failed to save");
        assert!(manager.save_exists());

        manager.delete_save().expect("Failed to delete save");
        assert!(!manager.save_exists());

        // Deleting again is a no-op.
        manager.delete_save().expect("Delete should be idempotent");
    }
}
