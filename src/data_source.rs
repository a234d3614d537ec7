use std::io;
use std::io::{BufRead, BufReader, Read};

use crate::result::{incomplete_data_error, incomplete_data_error_raw, IonResult};

/// Optimized read operations for parsing Ion.
///
/// The binary reader pulls all of its input through this trait, which is implemented for
/// every [BufRead]. Each method reads a small, bounded amount of data; when a request spans
/// the underlying buffer boundary, the data is staged in a scratch `Vec` supplied by the
/// caller.
pub trait IonDataSource: BufRead {
    /// Returns the next byte in the data source, or `None` if the source is exhausted.
    fn next_byte(&mut self) -> IonResult<Option<u8>>;

    /// Consumes and discards the next `number_of_bytes` bytes.
    fn skip_bytes(&mut self, number_of_bytes: usize) -> IonResult<()>;

    /// Calls `byte_processor` on each byte in turn until it returns `false`, then returns
    /// the total number of bytes that were read.
    fn read_next_byte_while<F>(&mut self, byte_processor: &mut F) -> IonResult<usize>
    where
        F: FnMut(u8) -> bool;

    /// Reads the next `length` bytes and passes them to `slice_processor` as a single slice,
    /// using `fallback_buffer` as scratch space if the bytes span an input buffer boundary.
    fn read_slice<T, F>(
        &mut self,
        length: usize,
        fallback_buffer: &mut Vec<u8>,
        slice_processor: F,
    ) -> IonResult<T>
    where
        F: FnOnce(&[u8]) -> IonResult<T>;
}

impl<T: BufRead> IonDataSource for T {
    fn next_byte(&mut self) -> IonResult<Option<u8>> {
        let buffer = self.fill_buf()?;
        if buffer.is_empty() {
            return Ok(None);
        }
        let byte = buffer[0];
        self.consume(1);
        Ok(Some(byte))
    }

    fn skip_bytes(&mut self, number_of_bytes: usize) -> IonResult<()> {
        let mut remaining = number_of_bytes;
        while remaining > 0 {
            let buffer = self.fill_buf()?;
            if buffer.is_empty() {
                return incomplete_data_error("ahead to next item", number_of_bytes - remaining);
            }
            let bytes_to_skip = remaining.min(buffer.len());
            self.consume(bytes_to_skip);
            remaining -= bytes_to_skip;
        }
        Ok(())
    }

    fn read_next_byte_while<F>(&mut self, byte_processor: &mut F) -> IonResult<usize>
    where
        F: FnMut(u8) -> bool,
    {
        let mut number_of_bytes_read: usize = 0;
        loop {
            match self.next_byte()? {
                Some(byte) => {
                    number_of_bytes_read += 1;
                    if !byte_processor(byte) {
                        return Ok(number_of_bytes_read);
                    }
                }
                None => {
                    return incomplete_data_error(
                        "a variable-length encoding",
                        number_of_bytes_read,
                    );
                }
            }
        }
    }

    fn read_slice<V, F>(
        &mut self,
        length: usize,
        fallback_buffer: &mut Vec<u8>,
        slice_processor: F,
    ) -> IonResult<V>
    where
        F: FnOnce(&[u8]) -> IonResult<V>,
    {
        let buffer = self.fill_buf()?;
        if buffer.len() >= length {
            // Fast path: the requested bytes are already contiguous in the input buffer.
            let result = slice_processor(&buffer[..length]);
            self.consume(length);
            return result;
        }
        // Slow path: stage the bytes in the fallback buffer first.
        fallback_buffer.clear();
        fallback_buffer.resize(length, 0);
        self.read_exact(fallback_buffer.as_mut_slice())
            .map_err(|error| match error.kind() {
                io::ErrorKind::UnexpectedEof => incomplete_data_error_raw("a value", length),
                _ => error.into(),
            })?;
        slice_processor(fallback_buffer.as_slice())
    }
}

/// Types that can be converted into an implementation of [IonDataSource].
pub trait ToIonDataSource {
    type DataSource: IonDataSource;
    fn to_ion_data_source(self) -> Self::DataSource;
}

impl ToIonDataSource for Vec<u8> {
    type DataSource = io::Cursor<Self>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self)
    }
}

impl<'a> ToIonDataSource for &'a [u8] {
    type DataSource = io::Cursor<Self>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self)
    }
}

impl<'a, const N: usize> ToIonDataSource for &'a [u8; N] {
    type DataSource = io::Cursor<&'a [u8]>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self.as_slice())
    }
}

impl ToIonDataSource for String {
    type DataSource = io::Cursor<Vec<u8>>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self.into_bytes())
    }
}

impl<'a> ToIonDataSource for &'a str {
    type DataSource = io::Cursor<&'a [u8]>;

    fn to_ion_data_source(self) -> Self::DataSource {
        io::Cursor::new(self.as_bytes())
    }
}

impl<T: Read> ToIonDataSource for BufReader<T> {
    type DataSource = Self;

    fn to_ion_data_source(self) -> Self::DataSource {
        self
    }
}

impl<T: AsRef<[u8]>> ToIonDataSource for io::Cursor<T> {
    type DataSource = Self;

    fn to_ion_data_source(self) -> Self::DataSource {
        self
    }
}

// Used by `ReaderBuilder`, which reassembles its sniffed header bytes with the rest of the
// input.
impl<T: Read, U: Read> ToIonDataSource for io::Chain<T, U>
where
    io::Chain<T, U>: BufRead,
{
    type DataSource = Self;

    fn to_ion_data_source(self) -> Self::DataSource {
        self
    }
}

#[cfg(test)]
mod data_source_tests {
    use super::*;
    use std::io::{BufReader, Cursor};

    #[test]
    fn next_byte_and_eof() -> IonResult<()> {
        let mut source = Cursor::new(&[1u8, 2]);
        assert_eq!(source.next_byte()?, Some(1));
        assert_eq!(source.next_byte()?, Some(2));
        assert_eq!(source.next_byte()?, None);
        Ok(())
    }

    #[test]
    fn skip_past_eof_is_an_error() {
        let mut source = Cursor::new(&[1u8, 2]);
        assert!(source.skip_bytes(3).is_err());
    }

    #[test]
    fn read_slice_spanning_buffer_boundary() -> IonResult<()> {
        // A one-byte input buffer guarantees the fallback path is exercised
        let mut source = BufReader::with_capacity(1, Cursor::new(&[1u8, 2, 3, 4]));
        let mut fallback = Vec::new();
        let total = source.read_slice(4, &mut fallback, |bytes| {
            Ok(bytes.iter().map(|b| *b as u32).sum::<u32>())
        })?;
        assert_eq!(total, 10);
        Ok(())
    }
}
