//! Hard limits enforced by the parser and its buffers.

/// The maximum number of bytes allowed in a single cell. Longer cells are
/// truncated to this length before dictionary insertion.
pub const MAX_VALUE_LENGTH: usize = 4096;

/// Smallest accepted `read_buffer_size` in [`crate::ParserOptions`].
pub const MIN_READ_BUFFER: usize = 4096;

/// Smallest accepted capacity for an input buffer. Four bytes is the
/// minimum needed to make forward progress past BOM sniffing.
pub const MIN_BUFFER_CAPACITY: usize = 4;

/// Default `read_buffer_size`: 100 MiB. The larger the buffer, the fewer
/// refills; when `max_line_count` is set, 2 KiB + 1 KiB per line is a
/// reasonable value instead.
pub const DEFAULT_READ_BUFFER: usize = 100 * 1024 * 1024;
