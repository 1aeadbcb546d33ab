//! Reading and writing flat arrays from and to disk.
//!
//! Every array is stored as raw little endian bytes in its own file, structures consisting of
//! several arrays are stored as a directory of such files (see `Deconstruct` and `Reconstruct`).
//! Only plain numeric element types can be stored, see `Pod`.
//!
//! # Example
//!
//! ```no_run
//! # use ch_road_router::io::*;
//! let head = Vec::<u32>::load_from("head")?;
//! head.write_to(&"head_copy")?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

use std::{
    ffi::OsStr,
    fs::{metadata, File},
    io::{prelude::*, Error, ErrorKind, Result},
    mem,
    path::Path,
    slice,
};

/// Marker for types without padding or invalid bit patterns.
///
/// # Safety
///
/// Implementors must be `Copy`, contain no padding and every byte pattern must be a valid value.
pub unsafe trait Pod: Copy + Default {}

unsafe impl Pod for u8 {}
unsafe impl Pod for u32 {}
unsafe impl Pod for u64 {}
unsafe impl Pod for f32 {}
unsafe impl Pod for f64 {}

/// Access to the raw bytes of an object. Use `Store` instead.
pub trait DataBytes {
    fn data_bytes(&self) -> &[u8];
}

/// Mutable access to the raw bytes of a preallocated object. Use `Load` instead.
pub trait DataBytesMut {
    fn data_bytes_mut(&mut self) -> &mut [u8];
}

impl<T: Pod> DataBytes for [T] {
    fn data_bytes(&self) -> &[u8] {
        let num_bytes = mem::size_of_val(self);
        unsafe { slice::from_raw_parts(self.as_ptr() as *const u8, num_bytes) }
    }
}

impl<T: Pod> DataBytes for Vec<T> {
    fn data_bytes(&self) -> &[u8] {
        self[..].data_bytes()
    }
}

impl<T: Pod> DataBytesMut for Vec<T> {
    fn data_bytes_mut(&mut self) -> &mut [u8] {
        let num_bytes = mem::size_of_val(&self[..]);
        unsafe { slice::from_raw_parts_mut(self.as_mut_ptr() as *mut u8, num_bytes) }
    }
}

/// Write an object to a single file.
pub trait Store: DataBytes {
    fn write_to(&self, path: &dyn AsRef<Path>) -> Result<()> {
        File::create(path)?.write_all(self.data_bytes())
    }
}

impl<T: DataBytes + ?Sized> Store for T {}

/// Read an object back from a single file.
pub trait Load: DataBytesMut + Sized {
    /// Allocate an object for the given number of bytes.
    /// Fails if the byte count does not fit the element size.
    fn new_with_bytes(num_bytes: usize) -> Result<Self>;

    fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let num_bytes = metadata(path.as_ref())?.len() as usize;
        let mut file = File::open(path)?;

        let mut object = Self::new_with_bytes(num_bytes)?;
        file.read_exact(object.data_bytes_mut())?;

        Ok(object)
    }
}

impl<T: Pod> Load for Vec<T> {
    fn new_with_bytes(num_bytes: usize) -> Result<Self> {
        if num_bytes % mem::size_of::<T>() != 0 {
            return Err(Error::new(
                ErrorKind::InvalidData,
                format!("{} bytes are not a multiple of the element size {}", num_bytes, mem::size_of::<T>()),
            ));
        }
        Ok(vec![T::default(); num_bytes / mem::size_of::<T>()])
    }
}

/// Store an object consisting of several arrays into a directory.
pub trait Deconstruct: Sized {
    /// Call `store_callback` with a file name and the data for each array.
    fn store_each(&self, store_callback: &dyn Fn(&str, &dyn Store) -> Result<()>) -> Result<()>;

    fn deconstruct_to<D: AsRef<OsStr>>(&self, dir: &D) -> Result<()> {
        let path = Path::new(dir);
        std::fs::create_dir_all(path)?;
        self.store_each(&|name, object: &dyn Store| object.write_to(&path.join(name)))
    }
}

/// Loads the arrays of a directory by name.
#[derive(Debug, Clone, Copy)]
pub struct Loader<'a> {
    path: &'a Path,
}

impl<'a> Loader<'a> {
    pub fn new(path: &'a Path) -> Self {
        Loader { path }
    }

    pub fn load<T: Load, P: AsRef<Path>>(&self, name: P) -> Result<T> {
        T::load_from(self.path.join(name))
    }

    pub fn path(&self) -> &Path {
        self.path
    }
}

/// Like `Reconstruct` but with some data already present in `self`,
/// e.g. a graph the loaded arrays refer to.
pub trait ReconstructPrepared<T: Sized>: Sized {
    type Error: From<Error>;

    fn reconstruct_with(self, loader: Loader) -> std::result::Result<T, Self::Error>;

    fn reconstruct_from<D: AsRef<OsStr>>(self, dir: &D) -> std::result::Result<T, Self::Error> {
        self.reconstruct_with(Loader::new(Path::new(dir)))
    }
}

/// Load an object consisting of several arrays from a directory.
pub trait Reconstruct: Sized {
    fn reconstruct_with(loader: Loader) -> Result<Self>;

    fn reconstruct_from<D: AsRef<OsStr>>(dir: &D) -> Result<Self> {
        Self::reconstruct_with(Loader::new(Path::new(dir)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vectors_survive_a_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("weights");
        let data = vec![1.5f64, -2.0, f64::INFINITY];
        data.write_to(&path).unwrap();
        assert_eq!(Vec::<f64>::load_from(&path).unwrap(), data);
    }

    #[test]
    fn rejects_truncated_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("bytes");
        vec![1u8, 2, 3].write_to(&path).unwrap();
        assert!(Vec::<u32>::load_from(&path).is_err());
    }
}
