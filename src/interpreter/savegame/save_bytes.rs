//! Big-endian word streams shared by the game image and save files

use crate::interpreter::core::instruction::Aword;

#[derive(Debug, Clone, Default)]
pub struct WordWriter {
    bytes: Vec<u8>,
}

impl WordWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn word(&mut self, value: Aword) -> &mut Self {
        self.bytes.extend_from_slice(&value.to_be_bytes());
        self
    }

    pub fn words(&mut self, values: &[Aword]) -> &mut Self {
        for &v in values {
            self.word(v);
        }
        self
    }

    /// Count followed by the words
    pub fn counted(&mut self, values: &[Aword]) -> &mut Self {
        self.word(values.len() as Aword).words(values)
    }

    pub fn flag(&mut self, value: bool) -> &mut Self {
        self.word(value as Aword)
    }

    /// Length word, bytes, zero padding to the next word boundary
    pub fn string(&mut self, text: &str) -> &mut Self {
        self.word(text.len() as Aword);
        self.bytes.extend_from_slice(text.as_bytes());
        while self.bytes.len() % 4 != 0 {
            self.bytes.push(0);
        }
        self
    }

    /// Bytes followed by a NUL
    pub fn c_string(&mut self, text: &str) -> &mut Self {
        self.bytes.extend_from_slice(text.as_bytes());
        self.bytes.push(0);
        self
    }

    pub fn raw(&mut self, data: &[u8]) -> &mut Self {
        self.bytes.extend_from_slice(data);
        self
    }

    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.bytes
    }
}

#[derive(Debug, Clone)]
pub struct WordReader<'a> {
    data: &'a [u8],
    pos: usize,
}

impl<'a> WordReader<'a> {
    pub fn new(data: &'a [u8]) -> Self {
        WordReader { data, pos: 0 }
    }

    pub fn position(&self) -> usize {
        self.pos
    }

    pub fn is_at_end(&self) -> bool {
        self.pos >= self.data.len()
    }

    pub fn raw(&mut self, len: usize) -> Result<&'a [u8], String> {
        let end = self
            .pos
            .checked_add(len)
            .filter(|&end| end <= self.data.len())
            .ok_or_else(|| {
                format!(
                    "Unexpected end of data at byte {} (wanted {} more)",
                    self.pos, len
                )
            })?;
        let slice = &self.data[self.pos..end];
        self.pos = end;
        Ok(slice)
    }

    pub fn word(&mut self) -> Result<Aword, String> {
        let b = self.raw(4)?;
        Ok(Aword::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn words(&mut self, count: usize) -> Result<Vec<Aword>, String> {
        // a count larger than the remaining data is corrupt, not a reason to allocate
        if count > (self.data.len() - self.pos.min(self.data.len())) / 4 {
            return Err(format!("Word count {count} exceeds remaining data"));
        }
        (0..count).map(|_| self.word()).collect()
    }

    pub fn counted(&mut self) -> Result<Vec<Aword>, String> {
        let count = self.word()? as usize;
        self.words(count)
    }

    /// A count word checked against the remaining data, each item needing at
    /// least `min_item_bytes`
    pub fn count(&mut self, min_item_bytes: usize) -> Result<usize, String> {
        let count = self.word()? as usize;
        let remaining = self.data.len().saturating_sub(self.pos);
        if count.saturating_mul(min_item_bytes.max(1)) > remaining {
            return Err(format!("Count {count} exceeds remaining data"));
        }
        Ok(count)
    }

    pub fn flag(&mut self) -> Result<bool, String> {
        match self.word()? {
            0 => Ok(false),
            1 => Ok(true),
            other => Err(format!("Invalid flag word {other}")),
        }
    }

    pub fn string(&mut self) -> Result<String, String> {
        let len = self.word()? as usize;
        let bytes = self.raw(len)?.to_vec();
        let padding = (4 - len % 4) % 4;
        self.raw(padding)?;
        String::from_utf8(bytes).map_err(|e| format!("Invalid UTF-8 in string: {e}"))
    }

    pub fn c_string(&mut self) -> Result<String, String> {
        let rest = &self.data[self.pos.min(self.data.len())..];
        let len = rest
            .iter()
            .position(|&b| b == 0)
            .ok_or_else(|| "Unterminated string".to_string())?;
        let bytes = self.raw(len)?.to_vec();
        self.raw(1)?;
        String::from_utf8(bytes).map_err(|e| format!("Invalid UTF-8 in string: {e}"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn strings_are_padded_to_words() {
        let mut w = WordWriter::new();
        w.string("abcde").word(7).c_string("xy");
        let bytes = w.into_bytes();
        assert_eq!(bytes.len(), 4 + 8 + 4 + 3);
        let mut r = WordReader::new(&bytes);
        assert_eq!(r.string().unwrap(), "abcde");
        assert_eq!(r.word().unwrap(), 7);
        assert_eq!(r.c_string().unwrap(), "xy");
        assert!(r.is_at_end());
        assert!(r.word().is_err());
    }

    #[test]
    fn absurd_counts_are_rejected() {
        let mut w = WordWriter::new();
        w.word(1_000_000).word(1);
        let bytes = w.into_bytes();
        assert!(WordReader::new(&bytes).counted().is_err());
        assert!(WordReader::new(&bytes).count(4).is_err());
    }

    #[test]
    fn flags_must_be_zero_or_one() {
        let mut w = WordWriter::new();
        w.flag(true).word(2);
        let bytes = w.into_bytes();
        let mut r = WordReader::new(&bytes);
        assert!(r.flag().unwrap());
        assert!(r.flag().is_err());
    }
}
