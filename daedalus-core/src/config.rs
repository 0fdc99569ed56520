use std::{
    fs::File,
    io::{Error, ErrorKind, Read, Write},
    path::Path,
};

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

bitflags! {
    /// Relaxations of the interpreter's strict checks, for scripts known to rely on
    /// engine leniency.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
    pub struct ExecutionFlags: u32 {
        /// Reads of members with no current instance yield defaults, writes are dropped.
        const ALLOW_NULL_INSTANCE_ACCESS = 1 << 0;
        /// Permit writes to symbols flagged `const`.
        const IGNORE_CONST_SPECIFIER = 1 << 1;
    }
}

/// VM configuration. Use [`VmConfigBuilder`] to build it from code.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VmConfig {
    pub flags: ExecutionFlags,
    /// Upper bound on simultaneously live instances.
    pub max_instances: usize,
    /// Upper bound on nested call frames, script and host re-entry combined.
    pub max_call_depth: usize,
}

impl Default for VmConfig {
    fn default() -> Self {
        Self { flags: ExecutionFlags::empty(), max_instances: 65_536, max_call_depth: 1024 }
    }
}

pub struct VmConfigBuilder {
    config: VmConfig,
}

impl Default for VmConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl VmConfigBuilder {
    pub fn new() -> Self {
        Self { config: Default::default() }
    }

    pub fn with_flags(mut self, flags: ExecutionFlags) -> Self {
        self.config.flags = flags;
        self
    }

    pub fn with_max_instances(mut self, max_instances: usize) -> Self {
        self.config.max_instances = max_instances;
        self
    }

    pub fn with_max_call_depth(mut self, max_call_depth: usize) -> Self {
        self.config.max_call_depth = max_call_depth;
        self
    }

    /// Retrieves the configuration built
    pub fn get(self) -> VmConfig {
        self.config
    }
}

/// Loads a [`VmConfig`] stored as JSON next to the game data.
pub struct VmConfigReader;

impl VmConfigReader {
    /// Reads `path`, writing the default configuration there first if it does not exist.
    pub fn read_or_create_default(path: &Path) -> Result<VmConfig, Error> {
        if path.exists() {
            return Self::read_config(path);
        }
        log::info!("no vm configuration at {}, writing defaults", path.display());
        let config = VmConfig::default();
        let mut file = File::create(path)?;
        file.write_all(&serde_json::to_vec_pretty(&config)?)?;
        Ok(config)
    }

    pub fn read_config_json(path: &Path) -> Result<VmConfig, Error> {
        if !path.exists() {
            return Err(Error::new(ErrorKind::NotFound, "File not found"));
        }
        Self::read_config(path)
    }

    fn read_config(path: &Path) -> Result<VmConfig, Error> {
        let mut file = File::open(path)?;
        let mut bytes = Vec::new();
        file.read_to_end(&mut bytes)?;
        let config = serde_json::from_slice(&bytes)?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn builder_overrides_defaults() {
        let config = VmConfigBuilder::new()
            .with_flags(ExecutionFlags::IGNORE_CONST_SPECIFIER)
            .with_max_instances(4)
            .get();
        assert_eq!(config.max_instances, 4);
        assert_eq!(config.max_call_depth, VmConfig::default().max_call_depth);
        assert!(config.flags.contains(ExecutionFlags::IGNORE_CONST_SPECIFIER));
        assert!(!config.flags.contains(ExecutionFlags::ALLOW_NULL_INSTANCE_ACCESS));
    }

    #[test]
    fn missing_file_is_created_with_defaults() {
        let path = std::env::temp_dir().join(format!("daedalus-vm-{}.json", std::process::id()));
        let _ = std::fs::remove_file(&path);
        assert_eq!(VmConfigReader::read_config_json(&path).unwrap_err().kind(), ErrorKind::NotFound);

        let created = VmConfigReader::read_or_create_default(&path).unwrap();
        assert_eq!(created.max_instances, VmConfig::default().max_instances);

        let custom = VmConfigBuilder::new()
            .with_flags(ExecutionFlags::ALLOW_NULL_INSTANCE_ACCESS)
            .with_max_call_depth(64)
            .get();
        std::fs::write(&path, serde_json::to_vec(&custom).unwrap()).unwrap();
        let read = VmConfigReader::read_or_create_default(&path).unwrap();
        assert_eq!(read.max_call_depth, 64);
        assert_eq!(read.flags, ExecutionFlags::ALLOW_NULL_INSTANCE_ACCESS);

        std::fs::write(&path, b"{ not json").unwrap();
        assert!(VmConfigReader::read_config_json(&path).is_err());
        std::fs::remove_file(&path).unwrap();
    }
}
