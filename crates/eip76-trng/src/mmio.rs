//! Memory-mapped register access
//!
//! Maps the EIP76 register window from its physical address into the
//! process through `/dev/mem` using rustix mmap wrappers. The mapping is
//! page-granular; the window offset inside the first page is preserved.

use crate::bus::RegisterBus;
use crate::error::{Result, TrngError};
use eip76_chip::regs;
use rustix::mm::{mmap, munmap, MapFlags, ProtFlags};
use std::fs::{File, OpenOptions};
use std::os::unix::io::AsFd;
use std::ptr::NonNull;

/// Memory-mapped EIP76 register window.
///
/// Provides bounds-checked volatile access to the device registers.
/// Unsafe operations are encapsulated here; the rest of the driver is
/// safe code against the [`RegisterBus`] trait.
pub struct MmioBus {
    /// Page-aligned mapping base
    ptr: NonNull<u8>,
    /// Total bytes mapped (page-rounded)
    map_len: usize,
    /// Window offset inside the mapping (phys base modulo page size)
    window: usize,
    /// Keeps the `/dev/mem` fd open for the mapping lifetime
    _file: File,
    /// Physical base, for diagnostics
    phys_base: usize,
}

impl std::fmt::Debug for MmioBus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MmioBus")
            .field("phys_base", &format_args!("{:#x}", self.phys_base))
            .field("ptr", &format_args!("{:p}", self.ptr))
            .field("map_len", &self.map_len)
            .finish()
    }
}

impl MmioBus {
    /// Map the register window at `phys_base`.
    ///
    /// # Errors
    ///
    /// Returns [`TrngError::Map`] if `/dev/mem` cannot be opened (needs
    /// root or `CAP_SYS_RAWIO`) or the mmap itself fails.
    pub fn map(phys_base: usize) -> Result<Self> {
        let page = rustix::param::page_size();
        let aligned = phys_base & !(page - 1);
        let window = phys_base - aligned;
        let map_len = (window + regs::REG_WINDOW_SIZE + page - 1) & !(page - 1);

        tracing::debug!("Mapping TRNG window: phys={phys_base:#x}, len={map_len:#x}");

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .open("/dev/mem")
            .map_err(|e| {
                TrngError::map_failed(phys_base, format!("cannot open /dev/mem: {e}"))
            })?;

        // SAFETY: mmap of device memory through /dev/mem.
        // - fd is valid (just opened), offset is page-aligned
        // - map_len is non-zero and page-rounded
        // - PROT_READ|PROT_WRITE, MAP_SHARED as device memory requires
        // - the file is stored in the struct so the fd outlives the mapping
        // - the region is unmapped exactly once, in Drop
        let ptr = unsafe {
            let addr = mmap(
                std::ptr::null_mut(),
                map_len,
                ProtFlags::READ | ProtFlags::WRITE,
                MapFlags::SHARED,
                file.as_fd(),
                aligned as u64,
            )
            .map_err(|e| TrngError::map_failed(phys_base, format!("mmap failed: {e}")))?;

            NonNull::new(addr.cast::<u8>())
                .ok_or_else(|| TrngError::map_failed(phys_base, "mmap returned null"))?
        };

        tracing::debug!("Mapped TRNG window at {ptr:p}+{window:#x}");

        Ok(Self {
            ptr,
            map_len,
            window,
            _file: file,
            phys_base,
        })
    }

    /// Physical base address this window was mapped from.
    #[must_use]
    pub const fn phys_base(&self) -> usize {
        self.phys_base
    }
}

impl RegisterBus for MmioBus {
    /// Read a 32-bit register.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the register window.
    fn read32(&self, offset: usize) -> u32 {
        assert!(
            offset + 4 <= regs::REG_WINDOW_SIZE,
            "register offset out of bounds"
        );
        // SAFETY: volatile read of a device register.
        // - ptr comes from the mmap in map(), valid for map_len bytes
        // - window + offset + 4 <= window + REG_WINDOW_SIZE <= map_len
        // - registers are 4-byte aligned by the hardware layout
        // - read_volatile keeps the compiler from caching or fusing the
        //   access; the hardware may change the value between reads
        unsafe {
            std::ptr::read_volatile(self.ptr.as_ptr().add(self.window + offset).cast::<u32>())
        }
    }

    /// Write a 32-bit register.
    ///
    /// # Panics
    ///
    /// Panics if `offset + 4` exceeds the register window.
    fn write32(&self, offset: usize, value: u32) {
        assert!(
            offset + 4 <= regs::REG_WINDOW_SIZE,
            "register offset out of bounds"
        );
        // SAFETY: volatile write to a device register.
        // - ptr/window bounds as in read32
        // - write_volatile keeps the compiler from eliding or reordering
        //   the store; writes have hardware side effects (INTACK advances
        //   the sample state machine)
        unsafe {
            std::ptr::write_volatile(
                self.ptr.as_ptr().add(self.window + offset).cast::<u32>(),
                value,
            );
        }
    }
}

impl Drop for MmioBus {
    fn drop(&mut self) {
        // SAFETY: ptr/map_len are exactly what mmap returned in map();
        // Drop runs at most once and no references outlive the struct.
        unsafe {
            let _ = munmap(self.ptr.as_ptr().cast(), self.map_len);
        }
        tracing::debug!("Unmapped TRNG window for {:#x}", self.phys_base);
    }
}

// SAFETY: MmioBus owns the mapping exclusively; moving it between threads
// does not invalidate the mapping (mmap'd memory is process-wide).
unsafe impl Send for MmioBus {}

// SAFETY: read32/write32 take &self, but the driver serialises all device
// access under its FIFO lock; the bus itself holds no unsynchronised state
// beyond the immutable ptr/len fields.
unsafe impl Sync for MmioBus {}
