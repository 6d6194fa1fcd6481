use crate::ByteOrder;
use crate::Error;
use crate::Result;
use crate::MAX_STRING_LEN;
use std::io;

/// Reads 32-bit values, swapping bytes when the file comes from a machine of
/// the other endianness.
pub struct Decoder<R> {
    r: R,
    order: ByteOrder,
}

impl<R> Decoder<R>
where
    R: io::Read,
{
    pub fn new(r: R, order: ByteOrder) -> Self {
        Self { r, order }
    }

    pub fn into_inner(self) -> R {
        self.r
    }

    pub fn get_mut(&mut self) -> &mut R {
        &mut self.r
    }

    fn read_word(&mut self) -> Result<u32> {
        let mut buf = [0x00; 4];
        self.r.read_exact(&mut buf)?;
        let word = u32::from_ne_bytes(buf);
        Ok(match self.order {
            ByteOrder::Native => word,
            ByteOrder::Swapped => word.swap_bytes(),
        })
    }

    pub fn magic(&mut self) -> Result<[u8; 4]> {
        let mut buf = [0x00; 4];
        self.r.read_exact(&mut buf)?;
        Ok(buf)
    }

    pub fn i32(&mut self) -> Result<i32> {
        Ok(self.read_word()? as i32)
    }

    pub fn f32(&mut self) -> Result<f32> {
        Ok(f32::from_bits(self.read_word()?))
    }

    pub fn xyz(&mut self) -> Result<[f32; 3]> {
        Ok([self.f32()?, self.f32()?, self.f32()?])
    }

    /// Reads a non-negative count.
    pub fn count(&mut self, what: &'static str) -> Result<usize> {
        let count = self.i32()?;
        usize::try_from(count).map_err(|_| Error::BadCount {
            what,
            count: count as i64,
        })
    }

    pub fn string(&mut self) -> Result<String> {
        let len = self.read_word()? as usize;
        if MAX_STRING_LEN < len {
            return Err(Error::BadString);
        }
        let mut buf = vec![0x00; len];
        self.r.read_exact(&mut buf)?;
        String::from_utf8(buf).map_err(|_| Error::BadString)
    }

    pub fn f32s(&mut self, len: usize) -> Result<Vec<f32>> {
        let mut buf = vec![0x00; len * 4];
        self.r.read_exact(&mut buf)?;
        Ok(buf
            .chunks_exact(4)
            .map(|bytes| {
                let word = u32::from_ne_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
                let word = match self.order {
                    ByteOrder::Native => word,
                    ByteOrder::Swapped => word.swap_bytes(),
                };
                f32::from_bits(word)
            })
            .collect())
    }
}

/// The writing counterpart of [`Decoder`].
pub struct Encoder<W> {
    w: W,
    order: ByteOrder,
}

impl<W> Encoder<W>
where
    W: io::Write,
{
    pub fn new(w: W, order: ByteOrder) -> Self {
        Self { w, order }
    }

    fn write_word(&mut self, word: u32) -> io::Result<()> {
        let word = match self.order {
            ByteOrder::Native => word,
            ByteOrder::Swapped => word.swap_bytes(),
        };
        self.w.write_all(&word.to_ne_bytes())
    }

    pub fn magic(&mut self, magic: &[u8; 4]) -> io::Result<()> {
        self.w.write_all(magic)
    }

    pub fn i32(&mut self, v: i32) -> io::Result<()> {
        self.write_word(v as u32)
    }

    pub fn f32(&mut self, v: f32) -> io::Result<()> {
        self.write_word(v.to_bits())
    }

    pub fn xyz(&mut self, v: [f32; 3]) -> io::Result<()> {
        v.into_iter().try_for_each(|c| self.f32(c))
    }

    pub fn count(&mut self, count: usize) -> io::Result<()> {
        let overflow = || io::Error::new(io::ErrorKind::InvalidInput, "count overflows i32");
        let count = i32::try_from(count).map_err(|_| overflow())?;
        self.i32(count)
    }

    pub fn string(&mut self, s: &str) -> io::Result<()> {
        self.write_word(s.len() as u32)?;
        self.w.write_all(s.as_bytes())
    }

    pub fn f32s(&mut self, values: &[f32]) -> io::Result<()> {
        values.iter().try_for_each(|v| self.f32(*v))
    }
}
