/// Customize how the decoder reacts to a record type tag it cannot size
#[derive(Debug, Default, PartialEq, Eq, Clone, Copy)]
pub enum UnknownTypeStrategy {
    /// Keep the enclosing block as opaque bytes and continue
    #[default]
    Opaque,

    /// Stop decoding and return an error
    Error,
}

/// Decodes save file bytes into blocks and documents
///
/// Instantiated via `Decoder::new` or `Decoder::builder`
#[derive(Debug, Default, Clone, Copy)]
pub struct Decoder {
    pub(crate) unknown_type: UnknownTypeStrategy,
}

impl Decoder {
    /// Creates a decoder with the default options
    pub fn new() -> Self {
        Decoder::default()
    }

    /// Customize decoding behavior
    ///
    /// ```
    /// use vaultsave::{Decoder, UnknownTypeStrategy};
    ///
    /// let decoder = Decoder::builder()
    ///     .on_unknown_type(UnknownTypeStrategy::Error)
    ///     .build();
    /// assert_eq!(decoder.unknown_type_strategy(), UnknownTypeStrategy::Error);
    /// ```
    pub fn builder() -> DecoderBuilder {
        DecoderBuilder::new()
    }

    pub fn unknown_type_strategy(&self) -> UnknownTypeStrategy {
        self.unknown_type
    }
}

/// Builds a tweaked decoder
#[derive(Debug, Default)]
pub struct DecoderBuilder {
    unknown_type: UnknownTypeStrategy,
}

impl DecoderBuilder {
    pub fn new() -> Self {
        DecoderBuilder::default()
    }

    /// Set what happens when a record type tag is unknown
    pub fn on_unknown_type(&mut self, strategy: UnknownTypeStrategy) -> &mut Self {
        self.unknown_type = strategy;
        self
    }

    pub fn build(&self) -> Decoder {
        Decoder {
            unknown_type: self.unknown_type,
        }
    }
}
