// SPDX-License-Identifier: Apache-2.0

use crate::{lock::FileLock, mapping::Mapping};
use std::{
    fs::{self, File, OpenOptions},
    io::{self, Read, Write},
    os::fd::AsRawFd,
    path::{Path, PathBuf},
};
use tracing::debug;

/// Where the kernel publishes UIO device descriptions.
pub const SYSFS_UIO_ROOT: &str = "/sys/class/uio";

/// Where the UIO character devices live.
pub const DEV_ROOT: &str = "/dev";

/// One entry of a UIO device's map table.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct MapInfo {
    /// Physical base address of the map
    pub addr: u64,
    /// Size of the map in bytes, as reported by the kernel (not page rounded)
    pub size: usize,
}

/// An opened `/dev/uioN` node together with its sysfs map table.
#[derive(Debug)]
pub struct UioDevice {
    name: String,
    node: PathBuf,
    file: File,
    maps: Vec<MapInfo>,
}

impl UioDevice {
    /// Opens the first UIO device whose name starts with `prefix`.
    ///
    /// Devices are scanned in index order (`uio0`, `uio1`, ...).
    ///
    /// # Errors
    ///
    /// Returns [`io::ErrorKind::NotFound`] if no device matches, or the
    /// underlying error if sysfs cannot be read or the node cannot be opened.
    pub fn find(prefix: &str) -> io::Result<Self> {
        Self::find_in(Path::new(SYSFS_UIO_ROOT), Path::new(DEV_ROOT), prefix)
    }

    /// Same as [`UioDevice::find`] with explicit sysfs and `/dev` roots.
    pub fn find_in(sysfs: &Path, dev: &Path, prefix: &str) -> io::Result<Self> {
        let mut entries = Vec::new();
        for entry in fs::read_dir(sysfs)? {
            let entry = entry?;
            let file_name = entry.file_name();
            let Some(index) = file_name
                .to_str()
                .and_then(|s| s.strip_prefix("uio"))
                .and_then(|s| s.parse::<u32>().ok())
            else {
                continue;
            };
            entries.push((index, entry.path()));
        }
        entries.sort_by_key(|(index, _)| *index);

        for (index, path) in entries {
            let name = match fs::read_to_string(path.join("name")) {
                Ok(name) => name.trim().to_owned(),
                Err(_) => continue,
            };
            if !name.starts_with(prefix) {
                continue;
            }

            let maps = read_maps(&path.join("maps"))?;
            let node = dev.join(format!("uio{index}"));
            let file = OpenOptions::new().read(true).write(true).open(&node)?;
            debug!("found {} at {} with {} maps", name, node.display(), maps.len());
            return Ok(Self {
                name,
                node,
                file,
                maps,
            });
        }

        Err(io::Error::new(
            io::ErrorKind::NotFound,
            format!("no uio device named {prefix}*"),
        ))
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn node(&self) -> &Path {
        &self.node
    }

    pub fn maps(&self) -> &[MapInfo] {
        &self.maps
    }

    pub fn map_info(&self, index: usize) -> Option<MapInfo> {
        self.maps.get(index).copied()
    }

    /// Maps entry `index` of the map table into this process.
    ///
    /// UIO selects the map through the mmap offset: map `N` lives at
    /// `N * page_size`.
    pub fn map(&self, index: usize) -> io::Result<Mapping> {
        let info = self.map_info(index).ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("{} has no map {index}", self.name),
            )
        })?;
        Mapping::new(&self.file, index, info)
    }

    /// Opens a dedicated lock on this unit.
    ///
    /// Each call opens the node again so locks taken through different
    /// handles exclude each other even inside one process.
    pub fn lock(&self) -> io::Result<FileLock> {
        FileLock::open(&self.node)
    }

    /// Unmasks the interrupt line.
    pub fn enable_irq(&self) -> io::Result<()> {
        (&self.file).write_all(&1u32.to_ne_bytes())
    }

    /// Masks the interrupt line.
    pub fn disable_irq(&self) -> io::Result<()> {
        (&self.file).write_all(&0u32.to_ne_bytes())
    }

    /// Blocks until the next interrupt and re-arms the line.
    ///
    /// Returns the kernel's running interrupt count.
    pub fn wait_irq(&self) -> io::Result<u32> {
        let mut count = [0u8; 4];
        (&self.file).read_exact(&mut count)?;
        self.enable_irq()?;
        Ok(u32::from_ne_bytes(count))
    }

    /// Consumes an interrupt already counted on this node without blocking.
    ///
    /// Every open of the node sees every interrupt of the unit, so events
    /// raised for another handle pile up here. Returns the count consumed, if
    /// one was pending.
    pub fn drain_irq(&self) -> io::Result<Option<u32>> {
        let mut pfd = libc::pollfd {
            fd: self.file.as_raw_fd(),
            events: libc::POLLIN,
            revents: 0,
        };
        // SAFETY: pfd is a single valid pollfd and the timeout is zero, so
        // poll neither blocks nor writes outside it.
        let ready = unsafe { libc::poll(&mut pfd, 1, 0) };
        if ready < 0 {
            return Err(io::Error::last_os_error());
        }
        if ready == 0 || pfd.revents & libc::POLLIN == 0 {
            return Ok(None);
        }
        self.wait_irq().map(Some)
    }
}

fn read_maps(dir: &Path) -> io::Result<Vec<MapInfo>> {
    let mut maps = Vec::new();
    if !dir.exists() {
        return Ok(maps);
    }
    loop {
        let map = dir.join(format!("map{}", maps.len()));
        if !map.exists() {
            break;
        }
        let addr = parse_hex(&fs::read_to_string(map.join("addr"))?)?;
        let size = parse_hex(&fs::read_to_string(map.join("size"))?)?;
        maps.push(MapInfo {
            addr,
            size: size as usize,
        });
    }
    Ok(maps)
}

fn parse_hex(text: &str) -> io::Result<u64> {
    let text = text.trim();
    let digits = text
        .strip_prefix("0x")
        .or_else(|| text.strip_prefix("0X"))
        .unwrap_or(text);
    u64::from_str_radix(digits, 16).map_err(|e| {
        io::Error::new(
            io::ErrorKind::InvalidData,
            format!("bad sysfs value {text:?}: {e}"),
        )
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::process;

    fn scratch(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("uiomux-{}-{}", tag, process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn fake_uio(sysfs: &Path, dev: &Path, index: u32, name: &str, maps: &[(u64, u64)]) {
        let dir = sysfs.join(format!("uio{index}"));
        fs::create_dir_all(&dir).unwrap();
        fs::write(dir.join("name"), format!("{name}\n")).unwrap();
        for (i, (addr, size)) in maps.iter().enumerate() {
            let map = dir.join("maps").join(format!("map{i}"));
            fs::create_dir_all(&map).unwrap();
            fs::write(map.join("addr"), format!("0x{addr:08x}\n")).unwrap();
            fs::write(map.join("size"), format!("0x{size:08x}\n")).unwrap();
        }
        fs::write(dev.join(format!("uio{index}")), []).unwrap();
    }

    #[test]
    fn test_parse_hex() {
        assert_eq!(parse_hex("0xfe920000\n").unwrap(), 0xfe92_0000);
        assert_eq!(parse_hex("0x000000cc").unwrap(), 0xcc);
        assert_eq!(parse_hex("27c").unwrap(), 0x27c);
        assert!(parse_hex("zz").is_err());
    }

    #[test]
    fn test_find_by_prefix() {
        let root = scratch("find");
        let sysfs = root.join("sys");
        let dev = root.join("dev");
        fs::create_dir_all(&dev).unwrap();
        fake_uio(&sysfs, &dev, 0, "VPU", &[(0xfe90_0000, 0xf0)]);
        fake_uio(
            &sysfs,
            &dev,
            2,
            "VEU3F0",
            &[(0xfe92_0000, 0xcc), (0x0d00_0000, 0x0040_0000)],
        );

        let uio = UioDevice::find_in(&sysfs, &dev, "VEU").unwrap();
        assert_eq!(uio.name(), "VEU3F0");
        assert_eq!(uio.node(), dev.join("uio2"));
        assert_eq!(
            uio.maps(),
            &[
                MapInfo {
                    addr: 0xfe92_0000,
                    size: 0xcc,
                },
                MapInfo {
                    addr: 0x0d00_0000,
                    size: 0x0040_0000,
                },
            ]
        );
        assert!(uio.map_info(2).is_none());

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_drain_pending_irq() {
        let root = scratch("drain");
        let sysfs = root.join("sys");
        let dev = root.join("dev");
        fs::create_dir_all(&dev).unwrap();
        fake_uio(&sysfs, &dev, 0, "VEU2H0", &[(0xfe92_0000, 0x27c)]);
        // a regular file always polls readable, standing in for a raised event
        fs::write(dev.join("uio0"), 7u32.to_ne_bytes()).unwrap();

        let uio = UioDevice::find_in(&sysfs, &dev, "VEU").unwrap();
        assert_eq!(uio.drain_irq().unwrap(), Some(7));

        fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_find_missing() {
        let root = scratch("missing");
        let sysfs = root.join("sys");
        let dev = root.join("dev");
        fs::create_dir_all(&dev).unwrap();
        fake_uio(&sysfs, &dev, 0, "BEU", &[(0xfe93_0000, 0x400)]);

        let err = UioDevice::find_in(&sysfs, &dev, "VEU").unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::NotFound);

        fs::remove_dir_all(&root).unwrap();
    }
}
