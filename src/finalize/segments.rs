//! WebM segment boundaries
//!
//! A recording that was paused holds one complete WebM stream per running
//! interval, back to back. Each stream starts with an EBML header whose
//! DocType is `webm`.

/// EBML header element ID
const EBML_MAGIC: [u8; 4] = [0x1A, 0x45, 0xDF, 0xA3];

/// DocType element (ID 0x4282, size 4) holding "webm"
const WEBM_DOCTYPE: [u8; 7] = [0x42, 0x82, 0x84, b'w', b'e', b'b', b'm'];

/// The DocType sits within the first few header bytes
const HEADER_WINDOW: usize = 64;

fn is_segment_start(data: &[u8], at: usize) -> bool {
    if !data[at..].starts_with(&EBML_MAGIC) {
        return false;
    }
    let end = data.len().min(at + HEADER_WINDOW);
    data[at + EBML_MAGIC.len()..end]
        .windows(WEBM_DOCTYPE.len())
        .any(|w| w == WEBM_DOCTYPE)
}

/// Split `data` into its WebM streams, in order.
///
/// Data that is not WebM comes back as a single segment.
pub fn split_segments(data: &[u8]) -> Vec<&[u8]> {
    let mut starts = vec![0];
    starts.extend(
        (1..data.len().saturating_sub(EBML_MAGIC.len() - 1))
            .filter(|&at| is_segment_start(data, at)),
    );

    let mut segments = Vec::with_capacity(starts.len());
    for (i, &start) in starts.iter().enumerate() {
        let end = starts.get(i + 1).copied().unwrap_or(data.len());
        segments.push(&data[start..end]);
    }
    segments
}

#[cfg(test)]
mod tests {
    use super::*;

    fn webm_header() -> Vec<u8> {
        let mut header = EBML_MAGIC.to_vec();
        header.push(0x9F);
        header.extend_from_slice(&[0x42, 0x86, 0x81, 0x01]);
        header.extend_from_slice(&[0x42, 0xF7, 0x81, 0x01]);
        header.extend_from_slice(&WEBM_DOCTYPE);
        header
    }

    #[test]
    fn test_single_stream_is_one_segment() {
        let mut data = webm_header();
        data.extend_from_slice(b"clusters");

        assert_eq!(split_segments(&data), vec![data.as_slice()]);
    }

    #[test]
    fn test_splits_back_to_back_streams() {
        let mut first = webm_header();
        first.extend_from_slice(b"one");
        let mut second = webm_header();
        second.extend_from_slice(b"two");
        let data = [first.clone(), second.clone()].concat();

        assert_eq!(split_segments(&data), vec![first.as_slice(), second.as_slice()]);
    }

    #[test]
    fn test_magic_without_webm_doctype_is_payload() {
        let mut data = webm_header();
        data.extend_from_slice(&EBML_MAGIC);
        data.extend_from_slice(b"not a header");

        assert_eq!(split_segments(&data).len(), 1);
    }

    #[test]
    fn test_short_and_empty_input() {
        assert_eq!(split_segments(b"ab"), vec![b"ab".as_slice()]);
        assert_eq!(split_segments(b""), vec![b"".as_slice()]);
    }
}
