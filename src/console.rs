//! Operator console helpers

use crate::signal::Interrupt;
use std::io::{self, BufRead, ErrorKind, Write};

/// Outcome of reading one operator line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Line {
    /// Line text without the trailing newline / carriage return
    Text(String),
    /// Input stream closed with nothing pending
    Eof,
    /// Ctrl+C while waiting for input
    Interrupted,
}

/// Print `prompt` and read a line from `input`
///
/// Reads through `fill_buf` directly so an `EINTR` surfaces here instead of
/// being retried inside `read_line`.
pub fn prompt<R: BufRead, W: Write>(
    input: &mut R,
    output: &mut W,
    prompt: &str,
    interrupt: &Interrupt,
) -> io::Result<Line> {
    write!(output, "{}", prompt)?;
    output.flush()?;

    let mut line = Vec::new();
    loop {
        if interrupt.is_raised() {
            return Ok(Line::Interrupted);
        }

        let (done, used) = match input.fill_buf() {
            Ok([]) => {
                if line.is_empty() {
                    return Ok(Line::Eof);
                }
                break;
            }
            Ok(buf) => match buf.iter().position(|&b| b == b'\n') {
                Some(i) => {
                    line.extend_from_slice(&buf[..i]);
                    (true, i + 1)
                }
                None => {
                    line.extend_from_slice(buf);
                    (false, buf.len())
                }
            },
            Err(e) if e.kind() == ErrorKind::Interrupted => continue,
            Err(e) => return Err(e),
        };

        input.consume(used);

        // A SIGINT landing just before read(2) blocks is only seen once the
        // read returns; drop the line rather than send it.
        if interrupt.is_raised() {
            return Ok(Line::Interrupted);
        }
        if done {
            break;
        }
    }

    if line.last() == Some(&b'\r') {
        line.pop();
    }

    Ok(Line::Text(String::from_utf8_lossy(&line).into_owned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};
    use std::sync::atomic::AtomicBool;

    fn interrupt() -> Interrupt {
        Interrupt::new(Box::leak(Box::new(AtomicBool::new(false))))
    }

    #[test]
    fn test_reads_one_line_at_a_time() {
        let mut input = Cursor::new(b"first\nsecond\r\n".to_vec());
        let mut output = Vec::new();
        let irq = interrupt();

        assert_eq!(
            prompt(&mut input, &mut output, "> ", &irq).unwrap(),
            Line::Text("first".to_string())
        );
        assert_eq!(
            prompt(&mut input, &mut output, "> ", &irq).unwrap(),
            Line::Text("second".to_string())
        );
        assert_eq!(prompt(&mut input, &mut output, "> ", &irq).unwrap(), Line::Eof);
        assert_eq!(output, b"> > > ");
    }

    #[test]
    fn test_partial_line_before_eof() {
        let mut input = Cursor::new(b"no newline".to_vec());
        let mut output = Vec::new();

        assert_eq!(
            prompt(&mut input, &mut output, "", &interrupt()).unwrap(),
            Line::Text("no newline".to_string())
        );
    }

    #[test]
    fn test_interrupted_before_read() {
        let irq = interrupt();
        irq.raise();
        let mut input = Cursor::new(b"ignored\n".to_vec());
        let mut output = Vec::new();

        assert_eq!(
            prompt(&mut input, &mut output, "> ", &irq).unwrap(),
            Line::Interrupted
        );
    }

    /// Raises the flag while the read is in flight, then hands back data
    struct SignalledReader {
        inner: Cursor<Vec<u8>>,
        interrupt: Interrupt,
    }

    impl io::Read for SignalledReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            self.inner.read(buf)
        }
    }

    impl BufRead for SignalledReader {
        fn fill_buf(&mut self) -> io::Result<&[u8]> {
            self.interrupt.raise();
            self.inner.fill_buf()
        }

        fn consume(&mut self, amt: usize) {
            self.inner.consume(amt)
        }
    }

    #[test]
    fn test_interrupt_during_read_drops_line() {
        let irq = interrupt();
        let mut input = SignalledReader {
            inner: Cursor::new(b"murat\n".to_vec()),
            interrupt: irq,
        };
        let mut output = Vec::new();

        assert_eq!(
            prompt(&mut input, &mut output, "> ", &irq).unwrap(),
            Line::Interrupted
        );
    }

    #[test]
    fn test_invalid_utf8_is_replaced() {
        let mut input = Cursor::new(vec![b'a', 0xff, b'b', b'\n']);
        let mut output = Vec::new();

        assert_eq!(
            prompt(&mut input, &mut output, "", &interrupt()).unwrap(),
            Line::Text("a\u{fffd}b".to_string())
        );
    }
}
