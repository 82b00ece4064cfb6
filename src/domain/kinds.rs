use crate::utils::error::{CableTraceError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Kinds of real endpoints. Each one carries a connected-endpoint cache.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EndpointKind {
    ConsolePort,
    ConsoleServerPort,
    PowerPort,
    PowerOutlet,
    Interface,
    PowerFeed,
    CircuitTermination,
}

impl EndpointKind {
    pub const ALL: [EndpointKind; 7] = [
        EndpointKind::ConsolePort,
        EndpointKind::ConsoleServerPort,
        EndpointKind::PowerPort,
        EndpointKind::PowerOutlet,
        EndpointKind::Interface,
        EndpointKind::PowerFeed,
        EndpointKind::CircuitTermination,
    ];

    pub fn app_label(&self) -> &'static str {
        match self {
            EndpointKind::CircuitTermination => "circuits",
            _ => "dcim",
        }
    }

    pub fn model_name(&self) -> &'static str {
        match self {
            EndpointKind::ConsolePort => "ConsolePort",
            EndpointKind::ConsoleServerPort => "ConsoleServerPort",
            EndpointKind::PowerPort => "PowerPort",
            EndpointKind::PowerOutlet => "PowerOutlet",
            EndpointKind::Interface => "Interface",
            EndpointKind::PowerFeed => "PowerFeed",
            EndpointKind::CircuitTermination => "CircuitTermination",
        }
    }

    /// `app_label.ModelName`, as printed by the retrace tool.
    pub fn label(&self) -> String {
        format!("{}.{}", self.app_label(), self.model_name())
    }

    pub fn verbose_name_plural(&self) -> &'static str {
        match self {
            EndpointKind::ConsolePort => "console ports",
            EndpointKind::ConsoleServerPort => "console server ports",
            EndpointKind::PowerPort => "power ports",
            EndpointKind::PowerOutlet => "power outlets",
            EndpointKind::Interface => "interfaces",
            EndpointKind::PowerFeed => "power feeds",
            EndpointKind::CircuitTermination => "circuit terminations",
        }
    }
}

impl fmt::Display for EndpointKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// Every kind of cable termination, pass-through ports included.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TerminationKind {
    Endpoint(EndpointKind),
    FrontPort,
    RearPort,
}

impl TerminationKind {
    /// Lowercase `app_label.modelname` used in topology documents.
    pub fn document_label(&self) -> String {
        match self {
            TerminationKind::Endpoint(kind) => kind.label().to_lowercase(),
            TerminationKind::FrontPort => "dcim.frontport".to_string(),
            TerminationKind::RearPort => "dcim.rearport".to_string(),
        }
    }

    pub fn from_document_label(label: &str) -> Option<Self> {
        match lookup(label) {
            Ok(ModelEntry::Termination(kind)) => Some(kind),
            _ => None,
        }
    }
}

/// Models known to the registry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ModelEntry {
    Termination(TerminationKind),
    /// Known model that cannot terminate a cable.
    Other,
}

const DCIM_MODELS: &[(&str, ModelEntry)] = &[
    ("consoleport", ModelEntry::Termination(TerminationKind::Endpoint(EndpointKind::ConsolePort))),
    (
        "consoleserverport",
        ModelEntry::Termination(TerminationKind::Endpoint(EndpointKind::ConsoleServerPort)),
    ),
    ("powerport", ModelEntry::Termination(TerminationKind::Endpoint(EndpointKind::PowerPort))),
    ("poweroutlet", ModelEntry::Termination(TerminationKind::Endpoint(EndpointKind::PowerOutlet))),
    ("interface", ModelEntry::Termination(TerminationKind::Endpoint(EndpointKind::Interface))),
    ("powerfeed", ModelEntry::Termination(TerminationKind::Endpoint(EndpointKind::PowerFeed))),
    ("frontport", ModelEntry::Termination(TerminationKind::FrontPort)),
    ("rearport", ModelEntry::Termination(TerminationKind::RearPort)),
    ("cable", ModelEntry::Other),
    ("device", ModelEntry::Other),
    ("devicetype", ModelEntry::Other),
    ("powerpanel", ModelEntry::Other),
    ("rack", ModelEntry::Other),
    ("site", ModelEntry::Other),
    ("virtualchassis", ModelEntry::Other),
];

const CIRCUITS_MODELS: &[(&str, ModelEntry)] = &[
    (
        "circuittermination",
        ModelEntry::Termination(TerminationKind::Endpoint(EndpointKind::CircuitTermination)),
    ),
    ("circuit", ModelEntry::Other),
    ("circuittype", ModelEntry::Other),
    ("provider", ModelEntry::Other),
];

fn lookup(label: &str) -> Result<ModelEntry> {
    let parts: Vec<&str> = label.split('.').collect();
    let (app_label, model_name) = match parts.as_slice() {
        [app, model] if !app.is_empty() && !model.is_empty() => (*app, *model),
        _ => {
            return Err(CableTraceError::InvalidModelFormat {
                name: label.to_string(),
            })
        }
    };

    let models = match app_label {
        "dcim" => DCIM_MODELS,
        "circuits" => CIRCUITS_MODELS,
        _ => {
            return Err(CableTraceError::UnknownApp {
                app_label: app_label.to_string(),
            })
        }
    };

    let wanted = model_name.to_lowercase();
    models
        .iter()
        .find(|(name, _)| *name == wanted)
        .map(|(_, entry)| *entry)
        .ok_or_else(|| CableTraceError::UnknownModel {
            label: label.to_string(),
        })
}

/// Resolves an `app_label.ModelName` label to a kind with a connected-endpoint cache.
pub fn parse_model_label(label: &str) -> Result<EndpointKind> {
    match lookup(label)? {
        ModelEntry::Termination(TerminationKind::Endpoint(kind)) => Ok(kind),
        ModelEntry::Termination(_) | ModelEntry::Other => Err(CableTraceError::InvalidModel {
            label: label.to_string(),
        }),
    }
}

/// The set of endpoint kinds a batch retrace runs over.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSelection {
    kinds: Vec<EndpointKind>,
}

impl ModelSelection {
    pub fn all() -> Self {
        Self {
            kinds: EndpointKind::ALL.to_vec(),
        }
    }

    /// Parses operator-supplied labels. No labels selects every kind.
    pub fn parse<S: AsRef<str>>(labels: &[S]) -> Result<Self> {
        if labels.is_empty() {
            return Ok(Self::all());
        }

        let mut kinds = Vec::with_capacity(labels.len());
        for label in labels {
            let kind = parse_model_label(label.as_ref())?;
            if !kinds.contains(&kind) {
                kinds.push(kind);
            }
        }
        Ok(Self { kinds })
    }

    pub fn kinds(&self) -> &[EndpointKind] {
        &self.kinds
    }

    pub fn contains(&self, kind: EndpointKind) -> bool {
        self.kinds.contains(&kind)
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }
}

impl From<Vec<EndpointKind>> for ModelSelection {
    fn from(kinds: Vec<EndpointKind>) -> Self {
        Self { kinds }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_model_label() {
        assert_eq!(parse_model_label("dcim.interface").unwrap(), EndpointKind::Interface);
        assert_eq!(parse_model_label("dcim.Interface").unwrap(), EndpointKind::Interface);
        assert_eq!(
            parse_model_label("circuits.CircuitTermination").unwrap(),
            EndpointKind::CircuitTermination
        );
    }

    #[test]
    fn test_parse_model_label_errors() {
        assert!(matches!(
            parse_model_label("interface"),
            Err(CableTraceError::InvalidModelFormat { .. })
        ));
        assert!(matches!(
            parse_model_label("dcim.interface.extra"),
            Err(CableTraceError::InvalidModelFormat { .. })
        ));
        assert!(matches!(
            parse_model_label("ipam.ipaddress"),
            Err(CableTraceError::UnknownApp { .. })
        ));
        assert!(matches!(
            parse_model_label("dcim.widget"),
            Err(CableTraceError::UnknownModel { .. })
        ));
        assert!(matches!(
            parse_model_label("dcim.frontport"),
            Err(CableTraceError::InvalidModel { .. })
        ));
        assert!(matches!(
            parse_model_label("dcim.device"),
            Err(CableTraceError::InvalidModel { .. })
        ));
    }

    #[test]
    fn test_empty_selection_means_all() {
        let selection = ModelSelection::parse::<&str>(&[]).unwrap();
        assert_eq!(selection.len(), EndpointKind::ALL.len());

        let selection = ModelSelection::parse(&["dcim.interface", "dcim.Interface"]).unwrap();
        assert_eq!(selection.kinds(), &[EndpointKind::Interface]);
    }

    #[test]
    fn test_document_labels() {
        for kind in EndpointKind::ALL {
            let label = TerminationKind::Endpoint(kind).document_label();
            assert_eq!(
                TerminationKind::from_document_label(&label),
                Some(TerminationKind::Endpoint(kind))
            );
        }
        assert_eq!(
            TerminationKind::from_document_label("dcim.rearport"),
            Some(TerminationKind::RearPort)
        );
        assert_eq!(TerminationKind::from_document_label("dcim.device"), None);
    }
}
