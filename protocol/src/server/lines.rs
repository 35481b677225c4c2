//! Reassembly of protocol frames from arbitrarily split text chunks
//!
//! A frame is a run of lines terminated by a blank line. If the first line
//! of a frame is `>ROOMID`, every message in the frame belongs to that room;
//! otherwise the frame is global. Text after the last newline is held back
//! until the rest of the line arrives.

use std::collections::VecDeque;

/// One complete frame, not yet parsed
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RawFrame {
    pub room_id: Option<String>,
    pub lines: Vec<String>,
}

#[derive(Debug, Default)]
pub struct FrameDecoder {
    partial: String,
    current: Option<RawFrame>,
    ready: VecDeque<RawFrame>,
}

impl FrameDecoder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk of text; complete frames become available via [`next_frame`](Self::next_frame)
    pub fn push(&mut self, chunk: &str) {
        self.partial.push_str(chunk);

        while let Some(newline) = self.partial.find('\n') {
            let line: String = self.partial.drain(..=newline).collect();
            self.accept_line(line.trim_end_matches(['\n', '\r']));
        }
    }

    pub fn next_frame(&mut self) -> Option<RawFrame> {
        self.ready.pop_front()
    }

    /// Whether a partial line or an unterminated frame is buffered
    pub fn has_pending(&self) -> bool {
        !self.partial.is_empty() || self.current.is_some()
    }

    fn accept_line(&mut self, line: &str) {
        if line.is_empty() {
            if let Some(frame) = self.current.take() {
                self.ready.push_back(frame);
            }
            return;
        }

        match self.current.as_mut() {
            Some(frame) => frame.lines.push(line.to_string()),
            None => {
                let frame = match line.strip_prefix('>') {
                    Some(room) => RawFrame {
                        room_id: Some(room.to_string()),
                        lines: Vec::new(),
                    },
                    None => RawFrame {
                        room_id: None,
                        lines: vec![line.to_string()],
                    },
                };
                self.current = Some(frame);
            }
        }
    }
}

/// Normalise one websocket message into a blank-line-terminated frame.
/// Blank lines inside the message would split it, so they are dropped.
pub fn frame_text(message: &str) -> String {
    let mut framed = String::with_capacity(message.len() + 2);
    for line in message.lines().filter(|l| !l.trim().is_empty()) {
        framed.push_str(line);
        framed.push('\n');
    }
    framed.push('\n');
    framed
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_room_frame() {
        let mut decoder = FrameDecoder::new();
        decoder.push(">battle-gen9randombattle-1\n|turn|2\n|upkeep\n\n");

        let frame = decoder.next_frame().unwrap();
        assert_eq!(frame.room_id.as_deref(), Some("battle-gen9randombattle-1"));
        assert_eq!(frame.lines, vec!["|turn|2", "|upkeep"]);
        assert!(decoder.next_frame().is_none());
        assert!(!decoder.has_pending());
    }

    #[test]
    fn test_partial_lines_are_buffered() {
        let mut decoder = FrameDecoder::new();
        decoder.push(">battle-x\n|-damage|p2a: Gar");
        assert!(decoder.next_frame().is_none());
        assert!(decoder.has_pending());

        decoder.push("chomp|50/100\n");
        assert!(decoder.next_frame().is_none());

        decoder.push("\n");
        let frame = decoder.next_frame().unwrap();
        assert_eq!(frame.lines, vec!["|-damage|p2a: Garchomp|50/100"]);
    }

    #[test]
    fn test_global_frame_and_room_frame_in_one_chunk() {
        let mut decoder = FrameDecoder::new();
        decoder.push("|challstr|4|abc\n\n>battle-y\n|init|battle\n\n");

        let global = decoder.next_frame().unwrap();
        assert_eq!(global.room_id, None);
        assert_eq!(global.lines, vec!["|challstr|4|abc"]);

        let room = decoder.next_frame().unwrap();
        assert_eq!(room.room_id.as_deref(), Some("battle-y"));
    }

    #[test]
    fn test_crlf_and_repeated_blank_lines() {
        let mut decoder = FrameDecoder::new();
        decoder.push("|updateuser| Agent|1|1\r\n\r\n\n\n");

        let frame = decoder.next_frame().unwrap();
        assert_eq!(frame.lines, vec!["|updateuser| Agent|1|1"]);
        assert!(decoder.next_frame().is_none());
    }

    #[test]
    fn test_frame_text() {
        assert_eq!(frame_text(">room\n|a\n\n|b"), ">room\n|a\n|b\n\n");
        assert_eq!(frame_text("|x"), "|x\n\n");
    }
}
