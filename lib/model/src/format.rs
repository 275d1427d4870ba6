use std::fmt;

/// An RDF serialization that CONSTRUCT output can be requested in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
#[non_exhaustive]
pub enum RdfSerialization {
    /// [JSON-LD](https://www.w3.org/TR/json-ld/)
    JsonLd,
    /// [Turtle](https://www.w3.org/TR/turtle/)
    Turtle,
    /// [Notation3](https://w3c.github.io/N3/spec/)
    N3,
    /// [N-Triples](https://www.w3.org/TR/n-triples/)
    NTriples,
    /// [N-Quads](https://www.w3.org/TR/n-quads/)
    NQuads,
    /// [TriG](https://www.w3.org/TR/trig/)
    TriG,
    /// [RDF/XML](https://www.w3.org/TR/rdf-syntax-grammar/)
    RdfXml,
}

impl RdfSerialization {
    const ALL: [RdfSerialization; 7] = [
        RdfSerialization::JsonLd,
        RdfSerialization::Turtle,
        RdfSerialization::N3,
        RdfSerialization::NTriples,
        RdfSerialization::NQuads,
        RdfSerialization::TriG,
        RdfSerialization::RdfXml,
    ];

    /// The media type requested from the engine for this serialization.
    ///
    /// ```
    /// use rdf_relay_model::RdfSerialization;
    ///
    /// assert_eq!(RdfSerialization::JsonLd.media_type(), "application/ld+json")
    /// ```
    pub const fn media_type(self) -> &'static str {
        match self {
            RdfSerialization::JsonLd => "application/ld+json",
            RdfSerialization::Turtle => "text/turtle",
            RdfSerialization::N3 => "text/n3",
            RdfSerialization::NTriples => "application/n-triples",
            RdfSerialization::NQuads => "application/n-quads",
            RdfSerialization::TriG => "application/trig",
            RdfSerialization::RdfXml => "application/rdf+xml",
        }
    }

    /// The human-readable name of this serialization.
    pub const fn name(self) -> &'static str {
        match self {
            RdfSerialization::JsonLd => "JSON-LD",
            RdfSerialization::Turtle => "Turtle",
            RdfSerialization::N3 => "N3",
            RdfSerialization::NTriples => "N-Triples",
            RdfSerialization::NQuads => "N-Quads",
            RdfSerialization::TriG => "TriG",
            RdfSerialization::RdfXml => "RDF/XML",
        }
    }

    /// Looks up a serialization from a media type, ignoring case and any
    /// media type parameters.
    ///
    /// ```
    /// use rdf_relay_model::RdfSerialization;
    ///
    /// assert_eq!(
    ///     RdfSerialization::from_media_type("text/turtle; charset=utf-8"),
    ///     Some(RdfSerialization::Turtle)
    /// )
    /// ```
    pub fn from_media_type(media_type: &str) -> Option<Self> {
        let essence = media_type.split(';').next().unwrap_or_default().trim();
        Self::ALL
            .into_iter()
            .find(|serialization| serialization.media_type().eq_ignore_ascii_case(essence))
    }
}

impl fmt::Display for RdfSerialization {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn each_serialization_resolves_its_own_media_type() {
        for serialization in RdfSerialization::ALL {
            assert_eq!(
                RdfSerialization::from_media_type(serialization.media_type()),
                Some(serialization)
            );
        }
    }

    #[test]
    fn lookup_ignores_parameters_and_case() {
        assert_eq!(
            RdfSerialization::from_media_type("APPLICATION/LD+JSON"),
            Some(RdfSerialization::JsonLd)
        );
        assert_eq!(
            RdfSerialization::from_media_type("application/n-quads ; charset=utf-8"),
            Some(RdfSerialization::NQuads)
        );
    }

    #[test]
    fn unknown_media_types_resolve_to_none() {
        assert_eq!(RdfSerialization::from_media_type("text/html"), None);
        assert_eq!(RdfSerialization::from_media_type(""), None);
    }
}
