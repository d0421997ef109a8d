//! Skim run configuration
//!
//! Tunables of a candidate search: hash width, index subsampling,
//! acceptance threshold, per-read output cap, partition memory budget and
//! resource limits.

use crate::constants::{
    DEFAULT_BASES_PER_HASH, DEFAULT_HASH_SAVE_STEPPING, DEFAULT_MAX_HITS_PER_READ,
    DEFAULT_MAX_MEMORY_HASHES, DEFAULT_MEGAHUB_CAP, DEFAULT_PERCENT_REQUIRED, MAX_BASES_PER_HASH,
    MIN_BASES_PER_HASH, is_valid_bases_per_hash,
};
use crate::error::{Result, SkimError};

/// Configuration parameters of a skim run
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SkimConfiguration {
    /// K-mer width in bases (1 to 32)
    pub bases_per_hash: usize,

    /// Keep every N-th hash per contiguous valid run when indexing
    pub hash_save_stepping: usize,

    /// Minimal percentage (0 to 100) of the possible overlap covered by hits
    pub percent_required: u8,

    /// Candidates kept per query read and strand
    pub max_hits_per_read: usize,

    /// Memory budget of one partition, in hash records
    pub max_memory_hashes: usize,

    /// Index rails only and scan only non-rail reads
    pub only_against_rails: bool,

    /// Raw hits of one scan above which the query becomes a megahub
    pub megahub_cap: u32,

    /// Number of threads for parallel operations (0 = all available cores)
    pub num_threads: usize,
}

impl Default for SkimConfiguration {
    fn default() -> Self {
        Self {
            bases_per_hash: DEFAULT_BASES_PER_HASH,
            hash_save_stepping: DEFAULT_HASH_SAVE_STEPPING,
            percent_required: DEFAULT_PERCENT_REQUIRED,
            max_hits_per_read: DEFAULT_MAX_HITS_PER_READ,
            max_memory_hashes: DEFAULT_MAX_MEMORY_HASHES,
            only_against_rails: false,
            megahub_cap: DEFAULT_MEGAHUB_CAP,
            num_threads: 0,
        }
    }
}

impl SkimConfiguration {
    /// Create a configuration with the given k-mer width and default tunables
    pub fn new(bases_per_hash: usize) -> Result<Self> {
        let config = Self {
            bases_per_hash,
            ..Self::default()
        };
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration parameters
    pub fn validate(&self) -> Result<()> {
        if !is_valid_bases_per_hash(self.bases_per_hash) {
            return Err(SkimError::InvalidConfig(format!(
                "bases_per_hash must be in range [{}, {}], got {}",
                MIN_BASES_PER_HASH, MAX_BASES_PER_HASH, self.bases_per_hash
            )));
        }
        if self.hash_save_stepping == 0 {
            return Err(SkimError::InvalidConfig(
                "hash_save_stepping must be at least 1".to_string(),
            ));
        }
        if self.percent_required > 100 {
            return Err(SkimError::InvalidConfig(format!(
                "percent_required must be in range [0, 100], got {}",
                self.percent_required
            )));
        }
        if self.max_hits_per_read == 0 {
            return Err(SkimError::InvalidConfig(
                "max_hits_per_read must be at least 1".to_string(),
            ));
        }
        if self.max_memory_hashes == 0 {
            return Err(SkimError::InvalidConfig(
                "max_memory_hashes must be at least 1".to_string(),
            ));
        }
        if self.megahub_cap == 0 {
            return Err(SkimError::InvalidConfig(
                "megahub_cap must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    /// Clipped bases one partition may hold
    ///
    /// Only every `hash_save_stepping`-th hash is stored, so the base budget
    /// is the hash budget times the stride.
    pub fn partition_base_budget(&self) -> u64 {
        (self.max_memory_hashes as u64).saturating_mul(self.hash_save_stepping as u64)
    }

    /// Log configuration parameters via tracing
    pub fn print(&self) {
        tracing::info!("Skim Configuration:");
        tracing::info!("  bases_per_hash = {}", self.bases_per_hash);
        tracing::info!("  hash_save_stepping = {}", self.hash_save_stepping);
        tracing::info!("  percent_required = {}", self.percent_required);
        tracing::debug!("  max_hits_per_read = {}", self.max_hits_per_read);
        tracing::debug!("  max_memory_hashes = {}", self.max_memory_hashes);
        tracing::info!("  only_against_rails = {}", self.only_against_rails);
        tracing::debug!("  megahub_cap = {}", self.megahub_cap);
        if self.num_threads == 0 {
            tracing::info!("  num_threads = all available cores");
        } else {
            tracing::info!("  num_threads = {}", self.num_threads);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = SkimConfiguration::default();
        assert_eq!(config.bases_per_hash, 16);
        assert_eq!(config.hash_save_stepping, 4);
        assert_eq!(config.percent_required, 50);
        assert!(!config.only_against_rails);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_new_config() {
        let config = SkimConfiguration::new(12).unwrap();
        assert_eq!(config.bases_per_hash, 12);
        assert!(SkimConfiguration::new(32).is_ok());
    }

    #[test]
    fn test_validate_bases_out_of_range() {
        assert!(SkimConfiguration::new(0).is_err());
        assert!(SkimConfiguration::new(33).is_err());
    }

    #[test]
    fn test_validate_zero_parameters() {
        let config = SkimConfiguration { hash_save_stepping: 0, ..SkimConfiguration::default() };
        assert!(config.validate().is_err());

        let config = SkimConfiguration { max_hits_per_read: 0, ..SkimConfiguration::default() };
        assert!(config.validate().is_err());

        let config = SkimConfiguration { max_memory_hashes: 0, ..SkimConfiguration::default() };
        assert!(config.validate().is_err());

        let config = SkimConfiguration { megahub_cap: 0, ..SkimConfiguration::default() };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate_percent() {
        let config = SkimConfiguration { percent_required: 101, ..SkimConfiguration::default() };
        assert!(matches!(config.validate(), Err(SkimError::InvalidConfig(_))));

        let config = SkimConfiguration { percent_required: 0, ..SkimConfiguration::default() };
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_partition_base_budget() {
        let config = SkimConfiguration {
            max_memory_hashes: 1000,
            hash_save_stepping: 3,
            ..SkimConfiguration::default()
        };
        assert_eq!(config.partition_base_budget(), 3000);
    }
}
