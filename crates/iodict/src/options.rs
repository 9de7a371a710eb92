/// Sizing policy for a [`ByteBuffer`](crate::ByteBuffer).
///
/// # Examples
///
/// ```rust
/// use iodict::{BufferOptions, ByteBuffer};
///
/// let buffer = ByteBuffer::with_options(BufferOptions {
///     initial_capacity: 1024,
///     ..Default::default()
/// });
/// assert!(buffer.capacity() >= 1024);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BufferOptions {
    /// Bytes allocated up front.
    ///
    /// # Default
    ///
    /// `0`
    pub initial_capacity: usize,

    /// Floor for every reallocation, so that a stream of tiny stores does not
    /// reallocate on each call.
    ///
    /// # Default
    ///
    /// `64`
    pub min_growth: usize,
}

impl Default for BufferOptions {
    fn default() -> Self {
        Self {
            initial_capacity: 0,
            min_growth: 64,
        }
    }
}

/// Configuration for the JSON reader and writer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// Whether to allow any Unicode whitespace between tokens.
    ///
    /// By default, only the four whitespace characters defined by the JSON
    /// specification are skipped: space (U+0020), line feed (U+000A),
    /// carriage return (U+000D), and horizontal tab (U+0009).
    ///
    /// # Default
    ///
    /// `false`
    pub allow_unicode_whitespace: bool,

    /// Deepest nesting of objects and arrays the reader accepts.
    ///
    /// The writer is infallible and does not check it: a tree built in code
    /// deeper than this renders fine but needs a larger limit to read back.
    ///
    /// # Default
    ///
    /// `512`
    pub max_depth: usize,

    /// Whether the writer indents nested values by two spaces per level.
    ///
    /// # Default
    ///
    /// `false`
    pub pretty: bool,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            allow_unicode_whitespace: false,
            max_depth: 512,
            pretty: false,
        }
    }
}

/// Configuration for the binary decoder.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BinaryOptions {
    /// Deepest nesting of maps the decoder accepts before reporting the
    /// payload as corrupt. The encoder refuses deeper trees with the same
    /// limit, so anything it writes reads back under equal options.
    ///
    /// # Default
    ///
    /// `512`
    pub max_depth: usize,
}

impl Default for BinaryOptions {
    fn default() -> Self {
        Self { max_depth: 512 }
    }
}
