//! Parameter cache and key generation
//!
//! IPA parameters are the expensive, reusable part of setup, so they live on
//! disk keyed by `k`. halo2_proofs 0.3 cannot serialize keys, so keys are
//! always regenerated from the params. A small manifest next to the params
//! records which vote circuit shape they were last used for.

use crate::circuit::{NUM_PRIVATE_WITNESSES, NUM_PUBLIC_INPUTS};
use anyhow::{Context, Result};
use halo2_proofs::{
    plonk::{keygen_pk, keygen_vk, Circuit, ProvingKey, VerifyingKey},
    poly::commitment::Params,
};
use halo2curves::pasta::{EqAffine, Fp};
use serde::{Deserialize, Serialize};
use std::{
    fs,
    io::BufReader,
    path::{Path, PathBuf},
};
use tracing::{debug, info, warn};

pub const MANIFEST_FILE: &str = "vote_circuit.json";

/// Shape of the vote circuit a params file was set up for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CircuitManifest {
    pub circuit: String,
    pub k: u32,
    pub public_inputs: usize,
    pub private_witnesses: usize,
    pub params_file: String,
}

impl CircuitManifest {
    pub fn vote(name: &str, k: u32) -> Self {
        Self {
            circuit: name.to_string(),
            k,
            public_inputs: NUM_PUBLIC_INPUTS,
            private_witnesses: NUM_PRIVATE_WITNESSES,
            params_file: params_file_name(k),
        }
    }
}

fn params_file_name(k: u32) -> String {
    format!("ipa_k{}.params", k)
}

#[derive(Debug, Clone)]
pub struct ParamsCache {
    dir: PathBuf,
}

impl ParamsCache {
    pub fn open(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref().to_path_buf();
        fs::create_dir_all(&dir)
            .context(format!("Failed to create params cache directory: {:?}", dir))?;
        Ok(Self { dir })
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub fn params_path(&self, k: u32) -> PathBuf {
        self.dir.join(params_file_name(k))
    }

    pub fn manifest_path(&self) -> PathBuf {
        self.dir.join(MANIFEST_FILE)
    }

    /// Returns the cached params for `k`.
    ///
    /// A missing, unreadable or mismatched file is replaced with freshly
    /// generated params.
    pub fn load_or_generate(&self, k: u32) -> Result<Params<EqAffine>> {
        let path = self.params_path(k);
        if path.exists() {
            match read_params(&path) {
                Ok(params) if params.k() == k => {
                    debug!(k, path = ?path, "loaded cached IPA parameters");
                    return Ok(params);
                }
                Ok(params) => {
                    warn!(k, found = params.k(), path = ?path, "cached params have the wrong size")
                }
                Err(e) => warn!(k, path = ?path, error = %e, "discarding unreadable params"),
            }
        }

        info!(k, "generating IPA parameters");
        let params = Params::<EqAffine>::new(k);
        self.store(&path, &params)?;
        Ok(params)
    }

    /// Writes via a sibling temp file so readers never see a partial file.
    fn store(&self, path: &Path, params: &Params<EqAffine>) -> Result<()> {
        let staging = path.with_extension("params.tmp");
        let mut file = fs::File::create(&staging)
            .context(format!("Failed to create params file at {:?}", staging))?;
        params.write(&mut file).context("Failed to write params")?;
        file.sync_all().context("Failed to flush params")?;
        fs::rename(&staging, path).context(format!("Failed to move params into {:?}", path))?;

        info!(path = ?path, "cached IPA parameters");
        Ok(())
    }

    pub fn write_manifest(&self, manifest: &CircuitManifest) -> Result<()> {
        let path = self.manifest_path();
        let json =
            serde_json::to_string_pretty(manifest).context("Failed to serialize manifest")?;
        fs::write(&path, json).context(format!("Failed to write manifest at {:?}", path))?;
        debug!(path = ?path, circuit = %manifest.circuit, k = manifest.k, "wrote manifest");
        Ok(())
    }
}

fn read_params(path: &Path) -> std::io::Result<Params<EqAffine>> {
    let mut reader = BufReader::new(fs::File::open(path)?);
    Params::<EqAffine>::read(&mut reader)
}

/// Generates the proving and verifying keys for `circuit`.
pub fn keygen<C>(
    params: &Params<EqAffine>,
    circuit: &C,
) -> Result<(ProvingKey<EqAffine>, VerifyingKey<EqAffine>)>
where
    C: Circuit<Fp>,
{
    let vk = keygen_vk(params, circuit).context("Failed to generate verification key")?;
    let pk = keygen_pk(params, vk.clone(), circuit).context("Failed to generate proving key")?;

    Ok((pk, vk))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::circuit::VoteCircuit;
    use tempfile::TempDir;

    #[test]
    fn test_cache_layout() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ParamsCache::open(temp_dir.path()).unwrap();

        assert_eq!(cache.params_path(9), temp_dir.path().join("ipa_k9.params"));
        assert_eq!(cache.manifest_path(), temp_dir.path().join(MANIFEST_FILE));
    }

    #[test]
    fn test_open_creates_nested_dir() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("nested").join("cache");

        let cache = ParamsCache::open(&dir).unwrap();
        assert!(dir.is_dir());
        assert_eq!(cache.dir(), dir.as_path());
    }

    #[test]
    fn test_params_are_generated_once_then_reused() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ParamsCache::open(temp_dir.path()).unwrap();

        let params = cache.load_or_generate(4).unwrap();
        assert_eq!(params.k(), 4);
        let first_write = fs::metadata(cache.params_path(4)).unwrap().modified().unwrap();

        let again = cache.load_or_generate(4).unwrap();
        assert_eq!(again.k(), 4);
        let second_write = fs::metadata(cache.params_path(4)).unwrap().modified().unwrap();
        assert_eq!(first_write, second_write);
        assert!(!cache.params_path(4).with_extension("params.tmp").exists());
    }

    #[test]
    fn test_truncated_params_file_is_regenerated() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ParamsCache::open(temp_dir.path()).unwrap();
        fs::write(cache.params_path(4), 4u32.to_le_bytes()).unwrap();

        let params = cache.load_or_generate(4).unwrap();
        assert_eq!(params.k(), 4);
        assert!(read_params(&cache.params_path(4)).is_ok());
    }

    #[test]
    fn test_params_of_other_size_are_regenerated() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ParamsCache::open(temp_dir.path()).unwrap();
        let small = cache.load_or_generate(4).unwrap();
        fs::copy(cache.params_path(4), cache.params_path(5)).unwrap();
        assert_eq!(small.k(), 4);

        let params = cache.load_or_generate(5).unwrap();
        assert_eq!(params.k(), 5);
        assert_eq!(read_params(&cache.params_path(5)).unwrap().k(), 5);
    }

    #[test]
    fn test_manifest_describes_vote_circuit() {
        let temp_dir = TempDir::new().unwrap();
        let cache = ParamsCache::open(temp_dir.path()).unwrap();
        let manifest = CircuitManifest::vote("private_vote", 9);

        cache.write_manifest(&manifest).unwrap();

        let json = fs::read_to_string(cache.manifest_path()).unwrap();
        let written: CircuitManifest = serde_json::from_str(&json).unwrap();
        assert_eq!(written, manifest);
        assert_eq!(written.public_inputs, 3);
        assert_eq!(written.params_file, "ipa_k9.params");
    }

    #[test]
    fn test_keygen_fails_when_circuit_does_not_fit() {
        let params = Params::<EqAffine>::new(4);
        assert!(keygen(&params, &VoteCircuit::default()).is_err());
    }
}
