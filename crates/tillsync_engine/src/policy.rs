//! Network policy: classify host connectivity for sync gating.

use parking_lot::RwLock;

/// How the current link is classified for sync purposes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    /// No connectivity; no sync attempt of any kind is made.
    Offline,
    /// Costly or limited link; automatic sync is suppressed, forced sync is
    /// still permitted.
    Metered,
    /// Automatic sync permitted.
    Unmetered,
}

/// The physical kind of link the host reports, when it reports one.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LinkKind {
    /// Wi-Fi or similar local wireless.
    Wifi,
    /// Wired connection.
    Ethernet,
    /// Mobile data.
    Cellular,
    /// The host gave no usable type signal.
    #[default]
    Unknown,
}

/// Host-provided connectivity signals.
///
/// Implementations wrap whatever the platform exposes; tests inject a
/// [`StaticMonitor`]. Platforms without a link-type or save-data signal
/// simply return the defaults.
pub trait NetworkMonitor: Send + Sync {
    /// Whether the host believes it has connectivity at all.
    fn is_online(&self) -> bool;

    /// The reported link type, [`LinkKind::Unknown`] when unavailable.
    fn link_kind(&self) -> LinkKind {
        LinkKind::Unknown
    }

    /// Whether the user asked to conserve data.
    fn save_data(&self) -> bool {
        false
    }
}

/// Classifies the current connectivity.
///
/// Absent any type signal the link counts as unmetered: failing open avoids
/// silently freezing sync on platforms that report nothing.
pub fn classify(monitor: &dyn NetworkMonitor) -> LinkClass {
    if !monitor.is_online() {
        return LinkClass::Offline;
    }
    match monitor.link_kind() {
        LinkKind::Cellular => LinkClass::Metered,
        LinkKind::Wifi | LinkKind::Ethernet => LinkClass::Unmetered,
        LinkKind::Unknown => {
            if monitor.save_data() {
                LinkClass::Metered
            } else {
                LinkClass::Unmetered
            }
        }
    }
}

/// A monitor with settable fields, for tests and embedders that push state.
#[derive(Debug)]
pub struct StaticMonitor {
    online: RwLock<bool>,
    kind: RwLock<LinkKind>,
    save_data: RwLock<bool>,
}

impl StaticMonitor {
    /// Creates a monitor reporting an unmetered online link.
    #[must_use]
    pub fn online() -> Self {
        Self {
            online: RwLock::new(true),
            kind: RwLock::new(LinkKind::Wifi),
            save_data: RwLock::new(false),
        }
    }

    /// Creates a monitor reporting no connectivity.
    #[must_use]
    pub fn offline() -> Self {
        let monitor = Self::online();
        monitor.set_online(false);
        monitor
    }

    /// Creates a monitor reporting mobile data.
    #[must_use]
    pub fn cellular() -> Self {
        let monitor = Self::online();
        monitor.set_link_kind(LinkKind::Cellular);
        monitor
    }

    /// Sets the online flag.
    pub fn set_online(&self, online: bool) {
        *self.online.write() = online;
    }

    /// Sets the reported link kind.
    pub fn set_link_kind(&self, kind: LinkKind) {
        *self.kind.write() = kind;
    }

    /// Sets the save-data flag.
    pub fn set_save_data(&self, save_data: bool) {
        *self.save_data.write() = save_data;
    }
}

impl NetworkMonitor for StaticMonitor {
    fn is_online(&self) -> bool {
        *self.online.read()
    }

    fn link_kind(&self) -> LinkKind {
        *self.kind.read()
    }

    fn save_data(&self) -> bool {
        *self.save_data.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offline_wins_over_everything() {
        let monitor = StaticMonitor::offline();
        monitor.set_link_kind(LinkKind::Wifi);
        assert_eq!(classify(&monitor), LinkClass::Offline);
    }

    #[test]
    fn cellular_is_metered() {
        assert_eq!(classify(&StaticMonitor::cellular()), LinkClass::Metered);
    }

    #[test]
    fn wifi_and_ethernet_are_unmetered() {
        let monitor = StaticMonitor::online();
        assert_eq!(classify(&monitor), LinkClass::Unmetered);
        monitor.set_link_kind(LinkKind::Ethernet);
        assert_eq!(classify(&monitor), LinkClass::Unmetered);
    }

    #[test]
    fn no_signal_fails_open() {
        let monitor = StaticMonitor::online();
        monitor.set_link_kind(LinkKind::Unknown);
        assert_eq!(classify(&monitor), LinkClass::Unmetered);
    }

    #[test]
    fn save_data_makes_unknown_metered() {
        let monitor = StaticMonitor::online();
        monitor.set_link_kind(LinkKind::Unknown);
        monitor.set_save_data(true);
        assert_eq!(classify(&monitor), LinkClass::Metered);
    }
}
