/// Codec behavior switches.
///
/// ```
/// use fracpack::CodecOptions;
///
/// let strict = CodecOptions {
///     allow_unknown_fields: false,
///     ..Default::default()
/// };
/// assert_eq!(strict.max_depth, 256);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CodecOptions {
    /// Accept Object/Tuple header bytes past the last declared member.
    pub allow_unknown_fields: bool,
    /// Maximum nesting depth while decoding.
    pub max_depth: usize,
}

impl Default for CodecOptions {
    fn default() -> Self {
        Self {
            allow_unknown_fields: true,
            max_depth: 256,
        }
    }
}
