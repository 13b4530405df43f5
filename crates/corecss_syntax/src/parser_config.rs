use corecss_shared::byte_stream::Location;

/// Context defines how the data needs to be parsed
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Context {
    /// A complete stylesheet: at-rules and rule sets
    #[default]
    Stylesheet,
    /// The content of a `style` attribute: only declarations
    StyleAttribute,
}

/// ParserConfig holds the configuration for the parser
#[derive(Clone, Debug)]
pub struct ParserConfig {
    /// Context defines how the data needs to be parsed
    pub context: Context,
    /// Location holds the start position of the given element in the data source
    pub location: Location,
    /// Optional source filename or url
    pub source: Option<String>,
    /// Drop the collected errors from the results. They are still logged.
    pub ignore_errors: bool,
}

impl Default for ParserConfig {
    fn default() -> Self {
        Self {
            context: Context::Stylesheet,
            location: Location::default(),
            source: None,
            ignore_errors: false,
        }
    }
}
