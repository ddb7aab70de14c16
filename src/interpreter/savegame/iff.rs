//! IFF (Interchange File Format) container for game images

use log::debug;

/// Form type of a compiled game
pub const GAME_FORM: [u8; 4] = *b"ACOD";

/// IFF file structure
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IffFile {
    pub form_type: [u8; 4],
    pub chunks: Vec<IffChunk>,
}

/// Individual chunk in an IFF file
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IffChunk {
    /// 4-character chunk type identifier
    pub chunk_type: [u8; 4],
    pub data: Vec<u8>,
}

impl IffFile {
    pub fn new(form_type: [u8; 4]) -> Self {
        IffFile {
            form_type,
            chunks: Vec::new(),
        }
    }

    pub fn add_chunk(&mut self, chunk_type: [u8; 4], data: Vec<u8>) {
        self.chunks.push(IffChunk { chunk_type, data });
    }

    /// Serialize as FORM, size, form type, then each chunk padded to even length
    pub fn to_bytes(&self) -> Vec<u8> {
        let total_size = 4 + self
            .chunks
            .iter()
            .map(|c| 8 + c.data.len() + c.data.len() % 2)
            .sum::<usize>();

        let mut output = Vec::with_capacity(8 + total_size);
        output.extend_from_slice(b"FORM");
        output.extend_from_slice(&(total_size as u32).to_be_bytes());
        output.extend_from_slice(&self.form_type);

        for chunk in &self.chunks {
            output.extend_from_slice(&chunk.chunk_type);
            output.extend_from_slice(&(chunk.data.len() as u32).to_be_bytes());
            output.extend_from_slice(&chunk.data);
            if chunk.data.len() % 2 == 1 {
                output.push(0);
            }
        }
        debug!("IFF image: {} chunks, {} bytes", self.chunks.len(), output.len());
        output
    }

    pub fn from_bytes(data: &[u8]) -> Result<Self, String> {
        if data.len() < 12 {
            return Err("File too small to be an IFF file".to_string());
        }
        if &data[0..4] != b"FORM" {
            return Err("Not an IFF file (missing FORM header)".to_string());
        }
        let total_size = u32::from_be_bytes([data[4], data[5], data[6], data[7]]) as usize;
        if total_size + 8 > data.len() {
            return Err(format!(
                "IFF file truncated: FORM claims {} bytes, {} present",
                total_size,
                data.len() - 8
            ));
        }
        let mut form_type = [0u8; 4];
        form_type.copy_from_slice(&data[8..12]);

        let mut iff = IffFile::new(form_type);
        let end = 8 + total_size;
        let mut pos = 12;
        while pos + 8 <= end {
            let mut chunk_type = [0u8; 4];
            chunk_type.copy_from_slice(&data[pos..pos + 4]);
            let size = u32::from_be_bytes([
                data[pos + 4],
                data[pos + 5],
                data[pos + 6],
                data[pos + 7],
            ]) as usize;
            pos += 8;
            if pos + size > end {
                return Err(format!(
                    "Chunk {} truncated",
                    String::from_utf8_lossy(&chunk_type)
                ));
            }
            iff.add_chunk(chunk_type, data[pos..pos + size].to_vec());
            pos += size + size % 2;
        }
        Ok(iff)
    }

    pub fn find_chunk(&self, chunk_type: &[u8; 4]) -> Option<&IffChunk> {
        self.chunks.iter().find(|c| &c.chunk_type == chunk_type)
    }

    /// Data of a chunk that must be present
    pub fn require_chunk(&self, chunk_type: &[u8; 4]) -> Result<&[u8], String> {
        self.find_chunk(chunk_type)
            .map(|c| c.data.as_slice())
            .ok_or_else(|| {
                format!(
                    "Missing {} chunk",
                    String::from_utf8_lossy(chunk_type)
                )
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_log::test;

    #[test]
    fn odd_chunks_are_padded() {
        let mut iff = IffFile::new(GAME_FORM);
        iff.add_chunk(*b"TEXT", b"abc".to_vec());
        iff.add_chunk(*b"CODE", vec![0, 0, 0, 1]);
        let bytes = iff.to_bytes();
        assert_eq!(bytes.len(), 12 + 8 + 4 + 8 + 4);
        let back = IffFile::from_bytes(&bytes).unwrap();
        assert_eq!(back, iff);
        assert_eq!(back.require_chunk(b"TEXT").unwrap(), b"abc");
        assert!(back.require_chunk(b"HEAD").is_err());
    }

    #[test]
    fn truncated_files_are_rejected() {
        let mut iff = IffFile::new(GAME_FORM);
        iff.add_chunk(*b"CODE", vec![1; 16]);
        let bytes = iff.to_bytes();
        assert!(IffFile::from_bytes(&bytes[..bytes.len() - 4]).is_err());
        assert!(IffFile::from_bytes(b"LIST\0\0\0\x04ACOD").is_err());
    }
}
