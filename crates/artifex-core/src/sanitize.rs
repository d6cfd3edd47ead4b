//! Sanitization policy applied to ADR free-text fields.
//!
//! The policy is pure and stateless: construct one instance at process
//! start and share it by reference with every component that needs it.

/// Strips markup from free-text input.
///
/// Implementations must be idempotent — sanitizing already sanitized
/// text returns it unchanged — and must not let nested or partially
/// overlapping tags reassemble into markup.
pub trait Sanitizer: Send + Sync {
    /// Returns `input` with all markup removed.
    fn sanitize(&self, input: &str) -> String;
}

/// Default policy: removes every tag unconditionally (no whitelist) and
/// returns text content only.
///
/// A single left-to-right scan tracks unmatched `<` positions; when a
/// `>` closes the innermost one, everything from that `<` onward is
/// discarded. Obfuscated payloads such as `<scr<script>ipt>` therefore
/// collapse to nothing instead of reassembling into a tag, and output
/// never contains a `<` that is later followed by a `>`.
#[derive(Debug, Default, Clone, Copy)]
pub struct MarkupStrippingSanitizer;

impl Sanitizer for MarkupStrippingSanitizer {
    fn sanitize(&self, input: &str) -> String {
        let mut out = String::with_capacity(input.len());
        let mut open_brackets: Vec<usize> = Vec::new();

        for ch in input.chars() {
            match ch {
                '<' => {
                    open_brackets.push(out.len());
                    out.push(ch);
                }
                '>' => match open_brackets.pop() {
                    Some(start) => out.truncate(start),
                    None => out.push('>'),
                },
                _ => out.push(ch),
            }
        }

        out
    }
}
