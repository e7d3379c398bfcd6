use std::fmt::Write;

/// Receives a description of each byte range as it gets parsed.
///
/// Observers are purely a side channel: whether one is attached never
/// changes what a parse returns.
pub trait ParseObserver {
    /// `bytes` is the buffer `offset` and `len` are relative to.
    fn parsed(&mut self, bytes: &[u8], offset: usize, len: usize, human: &str);

    fn change_indent(&mut self, delta: i32);
}

/// Writes every parse event to the `log` facade at trace level.
#[derive(Debug, Default)]
pub struct LogObserver {
    indent: usize,
}
impl LogObserver {
    pub fn new() -> Self {
        Self::default()
    }
}
impl ParseObserver for LogObserver {
    fn parsed(&mut self, bytes: &[u8], offset: usize, len: usize, human: &str) {
        let dump = bytes
            .get(offset..offset.saturating_add(len))
            .unwrap_or_default()
            .iter()
            .take(8)
            .fold(String::new(), |mut s, b| {
                let _ = write!(s, "{:02x}", b);
                s
            });

        log::trace!(
            "{:08x}: {:<16} {:indent$}{}",
            offset,
            dump,
            "",
            human,
            indent = self.indent * 2
        );
    }

    fn change_indent(&mut self, delta: i32) {
        self.indent = (self.indent as i64 + delta as i64).max(0) as usize;
    }
}


#[cfg(test)]
mod log_observer_tests {
    use super::*;

    #[test]
    fn it_should_never_indent_below_zero() {
        let mut observer = LogObserver::new();
        observer.change_indent(-3);
        observer.change_indent(1);

        assert_eq!(observer.indent, 1);
    }

    #[test]
    fn it_should_tolerate_ranges_outside_the_buffer() {
        LogObserver::new().parsed(&[1, 2], 1, 4, "past the end");
    }
}
