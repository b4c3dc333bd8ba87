//! Memory-mapped view of the driver's sweep dump region.
//!
//! The driver exposes two files:
//! - a metadata file holding one line `"<hex address> <decimal size>"`
//! - a device node that, when mapped at `address`, yields the physical region
//!
//! The mapped size is taken from the metadata as-is. If it disagrees with the ring
//! layout the capture still proceeds and a warning is logged, since the binary log
//! will then not decode with that layout.

use crate::config::MappedConfig;
use crate::error::{AppResult, SweepError};
use crate::source::ByteSource;
use memmap2::{MmapMut, MmapOptions};
use std::fs::OpenOptions;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};

/// Physical address and size of the shared region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MemInfo {
    /// Physical start address, used as the mapping offset.
    pub address: u64,
    /// Region length in bytes.
    pub size: usize,
}

impl FromStr for MemInfo {
    type Err = SweepError;

    fn from_str(line: &str) -> AppResult<Self> {
        let mut parts = line.split_whitespace();
        let (Some(address), Some(size)) = (parts.next(), parts.next()) else {
            return Err(SweepError::Config(format!(
                "meminfo line must be '<address> <size>', got '{}'",
                line.trim()
            )));
        };

        let hex = address
            .strip_prefix("0x")
            .or_else(|| address.strip_prefix("0X"))
            .unwrap_or(address);
        let address = u64::from_str_radix(hex, 16)
            .map_err(|e| SweepError::Config(format!("invalid meminfo address '{address}': {e}")))?;
        let size = size
            .parse::<usize>()
            .map_err(|e| SweepError::Config(format!("invalid meminfo size '{size}': {e}")))?;

        if size == 0 {
            return Err(SweepError::Config("meminfo size is zero".to_string()));
        }

        Ok(Self { address, size })
    }
}

impl MemInfo {
    /// Read and parse the first line of the metadata file.
    pub fn read(path: &Path) -> AppResult<Self> {
        let text =
            std::fs::read_to_string(path).map_err(|e| SweepError::resource(path, e))?;
        text.lines().next().unwrap_or_default().parse()
    }
}

/// Read-only consumer of a shared, externally written memory region.
pub struct MappedSource {
    mmap: MmapMut,
    path: PathBuf,
    info: MemInfo,
}

impl MappedSource {
    /// Discover the region from the metadata file and map it.
    pub fn open(config: &MappedConfig, expected_len: usize) -> AppResult<Self> {
        let info = MemInfo::read(&config.meminfo_path)?;
        info!(
            address = %format!("{:#x}", info.address),
            size = info.size,
            "Shared sweep dump region discovered"
        );

        if info.size != expected_len {
            warn!(
                mapped = info.size,
                expected = expected_len,
                "Mapped region size differs from ring layout; log will not decode with this layout"
            );
        }

        Self::map(&config.mmap_path, info)
    }

    /// Map `info.size` bytes of `path` starting at offset `info.address`.
    #[allow(unsafe_code)]
    pub fn map(path: &Path, info: MemInfo) -> AppResult<Self> {
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open(path)
            .map_err(|e| SweepError::resource(path, e))?;

        // SAFETY: the region is owned by the driver and outlives this process' use of
        // it. Concurrent driver writes make reads racy, which callers accept.
        let mmap = unsafe {
            MmapOptions::new()
                .offset(info.address)
                .len(info.size)
                .map_mut(&file)
                .map_err(|e| SweepError::resource(path, e))?
        };

        Ok(Self {
            mmap,
            path: path.to_path_buf(),
            info,
        })
    }

    /// Region metadata this mapping was created from.
    pub fn info(&self) -> MemInfo {
        self.info
    }
}

impl ByteSource for MappedSource {
    fn expected_len(&self) -> usize {
        self.info.size
    }

    fn snapshot(&mut self) -> AppResult<Option<Vec<u8>>> {
        // The producer may be writing concurrently; a torn copy is tolerated.
        Ok(Some(self.mmap.to_vec()))
    }

    fn describe(&self) -> String {
        format!(
            "mmap {} @ {:#x} ({} bytes)",
            self.path.display(),
            self.info.address,
            self.info.size
        )
    }
}

impl Drop for MappedSource {
    fn drop(&mut self) {
        tracing::debug!(path = %self.path.display(), "Releasing shared region mapping");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_parse_meminfo() {
        let info: MemInfo = "3e800000 6148\n".parse().unwrap();
        assert_eq!(info.address, 0x3e80_0000);
        assert_eq!(info.size, 6148);

        let info: MemInfo = "0x1000 24".parse().unwrap();
        assert_eq!(info.address, 0x1000);
    }

    #[test]
    fn test_parse_meminfo_rejects_garbage() {
        for line in ["", "3e800000", "zz 10", "1000 -5", "1000 ten", "1000 0"] {
            let err = line.parse::<MemInfo>().unwrap_err();
            assert!(matches!(err, SweepError::Config(_)), "line {line:?}");
        }
    }

    #[test]
    fn test_missing_meminfo_is_resource_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = MemInfo::read(&dir.path().join("meminfo")).unwrap_err();
        assert!(matches!(err, SweepError::Resource { .. }));
    }

    #[test]
    fn test_map_regular_file() {
        let dir = tempfile::tempdir().unwrap();
        let region = dir.path().join("region.bin");
        let mut file = std::fs::File::create(&region).unwrap();
        file.write_all(&[0xAB; 64]).unwrap();
        file.write_all(&[0xCD; 32]).unwrap();
        drop(file);

        let meminfo = dir.path().join("meminfo");
        std::fs::write(&meminfo, "40 32\n").unwrap();

        let config = MappedConfig {
            meminfo_path: meminfo,
            mmap_path: region,
        };
        let mut source = MappedSource::open(&config, 32).unwrap();
        assert_eq!(source.info().address, 64);
        assert_eq!(source.expected_len(), 32);

        let snapshot = source.snapshot().unwrap().unwrap();
        assert_eq!(snapshot, vec![0xCD; 32]);
    }

    #[test]
    fn test_map_missing_device() {
        let dir = tempfile::tempdir().unwrap();
        let info = MemInfo {
            address: 0,
            size: 16,
        };
        let err = MappedSource::map(&dir.path().join("nope"), info).err().unwrap();
        assert!(matches!(err, SweepError::Resource { .. }));
    }
}
