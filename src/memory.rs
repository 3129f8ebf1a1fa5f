/// A linear store of non-negative-integer cells, addressed by position.
///
/// Every cell holds an `i64`; the machine's invariant that cells never go
/// negative is upheld by the VM's arithmetic (see [`crate::processor`]), not
/// by this trait, which only guards against out-of-range addresses.
pub trait Storage {
    /// Returns the number of addressable cells.
    ///
    /// # Examples
    /// ```
    /// use accvm::{Storage, Memory};
    ///
    /// let memory = Memory::new(16);
    /// assert_eq!(memory.length(), 16);
    /// ```
    fn length(&self) -> usize;

    /// Checks whether `address` is within `[0, length())`.
    ///
    /// # Examples
    /// ```
    /// use accvm::{Storage, Memory};
    ///
    /// let memory = Memory::new(16);
    /// assert!(memory.check_address(4));
    /// assert!(!memory.check_address(16));
    /// ```
    fn check_address(&self, address: usize) -> bool {
        address < self.length()
    }

    /// Reads the cell at `address`.
    ///
    /// # Errors
    /// Returns an error if `address` is out of range.
    ///
    /// # Examples
    /// ```
    /// use accvm::{Storage, Memory};
    ///
    /// let memory = Memory::from(&[1, 2, 3, 4][..]);
    /// assert_eq!(memory.read(2), Ok(3));
    /// assert_eq!(memory.read(4), Err(()));
    /// ```
    fn read(&self, address: usize) -> Result<i64, ()>;

    /// Writes `value` to the cell at `address`.
    ///
    /// # Errors
    /// Returns an error if `address` is out of range.
    ///
    /// # Examples
    /// ```
    /// use accvm::{Storage, Memory};
    ///
    /// let mut memory = Memory::new(4);
    /// assert_eq!(memory.write(1, 42), Ok(()));
    /// assert_eq!(memory.read(1), Ok(42));
    /// assert_eq!(memory.write(4, 1), Err(()));
    /// ```
    fn write(&mut self, address: usize, value: i64) -> Result<(), ()>;
}

/// A basic `Storage` implementation backed by a single contiguous `Vec`.
pub struct Memory {
    cells: Vec<i64>,
}

impl Memory {
    /// Constructs a new, zero-filled `Memory` with the given number of cells.
    ///
    /// # Examples
    /// ```
    /// use accvm::{Storage, Memory};
    ///
    /// let memory = Memory::new(16);
    /// assert_eq!(memory.length(), 16);
    /// assert_eq!(memory.read(0), Ok(0));
    /// ```
    pub fn new(length: usize) -> Memory {
        Memory {
            cells: vec![0; length],
        }
    }

    /// Returns the backing cells as an immutable slice.
    pub fn cells(&self) -> &[i64] {
        &self.cells[..]
    }
}

impl Storage for Memory {
    fn length(&self) -> usize {
        self.cells.len()
    }

    fn read(&self, address: usize) -> Result<i64, ()> {
        self.cells.get(address).copied().ok_or(())
    }

    fn write(&mut self, address: usize, value: i64) -> Result<(), ()> {
        match self.cells.get_mut(address) {
            Some(cell) => {
                *cell = value;
                Ok(())
            }
            None => Err(()),
        }
    }
}

impl<'a> From<&'a [i64]> for Memory {
    fn from(s: &'a [i64]) -> Memory {
        Memory { cells: Vec::from(s) }
    }
}
