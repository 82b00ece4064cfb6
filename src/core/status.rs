use crate::core::trace::TracedPath;
use crate::domain::model::ConnectionStatus;

/// True when the path crosses at least one cable and every cable on it is connected.
/// A dead-end segment or any planned/decommissioning cable demotes the path.
pub fn path_status(path: &TracedPath) -> bool {
    !path.segments.is_empty()
        && path.segments.iter().all(|segment| {
            segment
                .cable
                .as_ref()
                .map(|cable| cable.is_connected())
                .unwrap_or(false)
        })
}

pub fn connection_status(path: &TracedPath) -> ConnectionStatus {
    ConnectionStatus::from(path_status(path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::trace::{Ambiguity, PathSegment};
    use crate::domain::model::{
        Cable, CableId, CableStatus, EndpointKind, Role, Termination, TerminationId,
    };

    fn iface(id: u64) -> Termination {
        Termination::new(
            TerminationId(id),
            "sw1",
            &format!("eth{}", id),
            Role::Endpoint(EndpointKind::Interface),
        )
    }

    fn segment(near: u64, far: Option<u64>, status: Option<CableStatus>) -> PathSegment {
        PathSegment {
            near: iface(near),
            cable: status.map(|s| {
                Cable::new(
                    CableId(near),
                    TerminationId(near),
                    TerminationId(far.unwrap_or(0)),
                    s,
                )
            }),
            far: far.map(iface),
        }
    }

    fn path(segments: Vec<PathSegment>) -> TracedPath {
        TracedPath {
            segments,
            ambiguity: Ambiguity::None,
        }
    }

    #[test]
    fn test_all_connected() {
        let p = path(vec![
            segment(1, Some(2), Some(CableStatus::Connected)),
            segment(3, Some(4), Some(CableStatus::Connected)),
        ]);
        assert!(path_status(&p));
        assert_eq!(connection_status(&p), ConnectionStatus::Connected);
    }

    #[test]
    fn test_single_planned_cable_demotes_path() {
        let p = path(vec![
            segment(1, Some(2), Some(CableStatus::Connected)),
            segment(3, Some(4), Some(CableStatus::Planned)),
        ]);
        assert!(!path_status(&p));
        assert_eq!(connection_status(&p), ConnectionStatus::Planned);
    }

    #[test]
    fn test_dead_end_demotes_path() {
        let p = path(vec![
            segment(1, Some(2), Some(CableStatus::Connected)),
            segment(3, None, None),
        ]);
        assert!(!path_status(&p));
    }

    #[test]
    fn test_no_cable_segments() {
        assert!(!path_status(&path(vec![segment(1, None, None)])));
        assert!(!path_status(&path(vec![])));
    }
}
