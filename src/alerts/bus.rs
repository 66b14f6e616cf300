//! Alert bus implementation
//!
//! Deduplicates alerts by key, keeps the authoritative alert set and fans new
//! alerts out to registered listeners. Safe to share between threads.

use super::types::{Alert, AlertKey, AlertSeverity};
use crate::domain::PatientId;
use crate::error::{AlertError, ListenerError};
use crate::sync::{lock, read, write};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::panic::{self, AssertUnwindSafe};
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, RwLock};

/// Receiver of newly accepted alerts
///
/// Listeners run synchronously on the submitting thread. When the submitter
/// is an evaluation pass, that patient's history stays locked until the pass
/// ends: a slow listener delays the next pass for the same patient, and a
/// listener must not evaluate or read the history of the patient it is being
/// notified about. Other patients are not affected.
pub trait AlertListener: Send + Sync {
    /// Called once per newly accepted alert
    fn on_alert(&self, alert: &Alert) -> Result<(), ListenerError>;

    /// Listener name for logging
    fn name(&self) -> &str {
        "listener"
    }
}

/// Adapter turning a closure into a listener
pub struct CallbackListener<F> {
    name: String,
    callback: F,
}

impl<F> CallbackListener<F>
where
    F: Fn(&Alert) + Send + Sync,
{
    pub fn new(name: impl Into<String>, callback: F) -> Self {
        Self {
            name: name.into(),
            callback,
        }
    }
}

impl<F> AlertListener for CallbackListener<F>
where
    F: Fn(&Alert) + Send + Sync,
{
    fn on_alert(&self, alert: &Alert) -> Result<(), ListenerError> {
        (self.callback)(alert);
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}

/// Handle returned on registration, used to unregister
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(u64);

#[derive(Clone)]
struct Registration {
    id: ListenerId,
    listener: Arc<dyn AlertListener>,
}

#[derive(Default)]
struct AlertLedger {
    keys: HashSet<AlertKey>,
    /// Accepted alerts in acceptance order
    alerts: Vec<Alert>,
}

/// Deduplicating, thread-safe alert publish point
///
/// The listener list is copy-on-write: `submit` grabs a snapshot while it
/// holds the alert lock and notifies outside it, so registration changes never
/// race with an in-flight notification.
pub struct AlertBus {
    ledger: Mutex<AlertLedger>,
    listeners: RwLock<Arc<Vec<Registration>>>,
    next_listener_id: AtomicU64,
}

impl AlertBus {
    /// Create an empty bus
    pub fn new() -> Self {
        Self {
            ledger: Mutex::new(AlertLedger::default()),
            listeners: RwLock::new(Arc::new(Vec::new())),
            next_listener_id: AtomicU64::new(1),
        }
    }

    /// Submit an alert.
    ///
    /// Returns `Ok(true)` if the alert was new and listeners were notified,
    /// `Ok(false)` if an alert with the same key was already accepted.
    /// An absent or structurally invalid alert fails with
    /// [`AlertError::InvalidArgument`] and leaves the set untouched.
    pub fn submit(&self, alert: impl Into<Option<Alert>>) -> Result<bool, AlertError> {
        let alert = alert
            .into()
            .ok_or_else(|| AlertError::InvalidArgument("alert cannot be absent".to_string()))?;
        alert.validate()?;

        let snapshot = {
            let mut ledger = lock(&self.ledger);
            if !ledger.keys.insert(alert.key()) {
                log::trace!("Duplicate alert suppressed: {}", alert.key());
                return Ok(false);
            }
            ledger.alerts.push(alert.clone());
            Arc::clone(&read(&self.listeners))
        };

        log::debug!("Accepted alert {}: {}", alert.key(), alert.description);
        Self::notify(&snapshot, &alert);
        Ok(true)
    }

    fn notify(listeners: &[Registration], alert: &Alert) {
        for registration in listeners {
            let listener = &registration.listener;
            match panic::catch_unwind(AssertUnwindSafe(|| listener.on_alert(alert))) {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    log::warn!("Failed to notify {}: {}", listener.name(), e);
                }
                Err(payload) => {
                    let message = payload
                        .downcast_ref::<&str>()
                        .map(|s| s.to_string())
                        .or_else(|| payload.downcast_ref::<String>().cloned())
                        .unwrap_or_else(|| "unknown panic".to_string());
                    log::warn!("Listener {} panicked: {}", listener.name(), message);
                }
            }
        }
    }

    /// Register a listener
    pub fn add_listener(&self, listener: Arc<dyn AlertListener>) -> ListenerId {
        let id = ListenerId(self.next_listener_id.fetch_add(1, Ordering::Relaxed));
        let mut listeners = write(&self.listeners);
        let mut updated = Vec::with_capacity(listeners.len() + 1);
        updated.extend(listeners.iter().cloned());
        updated.push(Registration { id, listener });
        *listeners = Arc::new(updated);
        id
    }

    /// Register a closure as a listener
    pub fn subscribe<F>(&self, callback: F) -> ListenerId
    where
        F: Fn(&Alert) + Send + Sync + 'static,
    {
        self.add_listener(Arc::new(CallbackListener::new("callback", callback)))
    }

    /// Unregister a listener. Submits starting after this returns never reach it.
    pub fn remove_listener(&self, id: ListenerId) -> bool {
        let mut listeners = write(&self.listeners);
        if !listeners.iter().any(|r| r.id == id) {
            return false;
        }
        let updated: Vec<_> = listeners.iter().filter(|r| r.id != id).cloned().collect();
        *listeners = Arc::new(updated);
        true
    }

    /// Number of registered listeners
    pub fn listener_count(&self) -> usize {
        read(&self.listeners).len()
    }

    /// Copy of every accepted alert, in acceptance order
    pub fn all_alerts(&self) -> Vec<Alert> {
        lock(&self.ledger).alerts.clone()
    }

    /// Copy of the accepted alerts for one patient
    pub fn alerts_for_patient(&self, patient_id: PatientId) -> Vec<Alert> {
        lock(&self.ledger)
            .alerts
            .iter()
            .filter(|a| a.patient_id == patient_id)
            .cloned()
            .collect()
    }

    /// Forget all accepted alerts; listeners stay registered
    pub fn clear_alerts(&self) {
        let mut ledger = lock(&self.ledger);
        ledger.keys.clear();
        ledger.alerts.clear();
    }

    /// Number of accepted alerts
    pub fn len(&self) -> usize {
        lock(&self.ledger).alerts.len()
    }

    /// Whether no alerts have been accepted
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Get alert count by severity
    pub fn count_by_severity(&self) -> HashMap<AlertSeverity, usize> {
        let mut counts = HashMap::new();
        for alert in &lock(&self.ledger).alerts {
            *counts.entry(alert.severity).or_insert(0) += 1;
        }
        counts
    }
}

impl Default for AlertBus {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for AlertBus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AlertBus")
            .field("alerts", &self.len())
            .field("listeners", &self.listener_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::{alert, FailingListener, PanickingListener, RecordingListener};
    use std::sync::atomic::AtomicUsize;

    #[test]
    fn test_submit_and_list() {
        let bus = AlertBus::new();
        assert!(bus.submit(alert(1, "TestAlert", 1000)).unwrap());

        let alerts = bus.all_alerts();
        assert_eq!(alerts.len(), 1);
        assert_eq!(alerts[0].alert_type, "TestAlert");
    }

    #[test]
    fn test_duplicate_submission_collapses() {
        let bus = AlertBus::new();
        let recorder = Arc::new(RecordingListener::new());
        bus.add_listener(recorder.clone());

        let a = alert(1, "TestAlert", 1000);
        assert!(bus.submit(a.clone()).unwrap());
        assert!(!bus.submit(a).unwrap());

        assert_eq!(bus.len(), 1);
        assert_eq!(recorder.count(), 1);
    }

    #[test]
    fn test_same_key_different_description_collapses() {
        let bus = AlertBus::new();
        let mut b = alert(1, "TestAlert", 1000);
        b.description = "something else".to_string();

        bus.submit(alert(1, "TestAlert", 1000)).unwrap();
        assert!(!bus.submit(b).unwrap());
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_submit_none_is_invalid() {
        let bus = AlertBus::new();
        bus.submit(alert(1, "TestAlert", 1000)).unwrap();

        let err = bus.submit(None::<Alert>).unwrap_err();
        assert!(matches!(err, AlertError::InvalidArgument(_)));
        assert_eq!(bus.len(), 1);
    }

    #[test]
    fn test_submit_invalid_alert() {
        let bus = AlertBus::new();
        let recorder = Arc::new(RecordingListener::new());
        bus.add_listener(recorder.clone());

        assert!(bus.submit(alert(0, "TestAlert", 1000)).is_err());
        assert!(bus.submit(alert(1, "", 1000)).is_err());
        assert!(bus.is_empty());
        assert_eq!(recorder.count(), 0);
    }

    #[test]
    fn test_multiple_listeners_in_registration_order() {
        let bus = AlertBus::new();
        let order = Arc::new(Mutex::new(Vec::new()));

        for tag in ["first", "second", "third"] {
            let order = Arc::clone(&order);
            bus.subscribe(move |_| order.lock().unwrap().push(tag));
        }

        bus.submit(alert(1, "TestAlert", 1000)).unwrap();
        assert_eq!(*order.lock().unwrap(), vec!["first", "second", "third"]);
    }

    #[test]
    fn test_remove_listener() {
        let bus = AlertBus::new();
        let count = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&count);
        let id = bus.subscribe(move |_| {
            counter.fetch_add(1, Ordering::SeqCst);
        });

        assert!(bus.remove_listener(id));
        assert!(!bus.remove_listener(id));
        assert_eq!(bus.listener_count(), 0);

        bus.submit(alert(1, "TestAlert", 1000)).unwrap();
        assert_eq!(count.load(Ordering::SeqCst), 0);
    }

    #[test]
    fn test_failing_listener_does_not_block_others() {
        let bus = AlertBus::new();
        let recorder = Arc::new(RecordingListener::new());
        bus.add_listener(Arc::new(FailingListener));
        bus.add_listener(Arc::new(PanickingListener));
        bus.add_listener(recorder.clone());

        assert!(bus.submit(alert(1, "TestAlert", 1000)).unwrap());
        assert!(bus.submit(alert(1, "TestAlert", 2000)).unwrap());
        assert_eq!(recorder.count(), 2);
        assert_eq!(bus.len(), 2);
    }

    #[test]
    fn test_listener_may_register_during_notification() {
        let bus = Arc::new(AlertBus::new());
        let inner = Arc::clone(&bus);
        bus.subscribe(move |_| {
            inner.subscribe(|_| {});
        });

        bus.submit(alert(1, "TestAlert", 1000)).unwrap();
        assert_eq!(bus.listener_count(), 2);
    }

    #[test]
    fn test_alerts_for_patient() {
        let bus = AlertBus::new();
        bus.submit(alert(1, "TestAlert1", 1000)).unwrap();
        bus.submit(alert(2, "TestAlert2", 2000)).unwrap();
        bus.submit(alert(1, "TestAlert3", 3000)).unwrap();

        assert_eq!(bus.alerts_for_patient(1).len(), 2);
        assert_eq!(bus.alerts_for_patient(2).len(), 1);
        assert!(bus.alerts_for_patient(3).is_empty());
    }

    #[test]
    fn test_clear_alerts_keeps_listeners() {
        let bus = AlertBus::new();
        let recorder = Arc::new(RecordingListener::new());
        bus.add_listener(recorder.clone());

        bus.submit(alert(1, "TestAlert", 1000)).unwrap();
        bus.clear_alerts();
        assert!(bus.is_empty());
        assert_eq!(bus.listener_count(), 1);

        // Cleared keys may be accepted again
        assert!(bus.submit(alert(1, "TestAlert", 1000)).unwrap());
        assert_eq!(recorder.count(), 2);
    }

    #[test]
    fn test_count_by_severity() {
        let bus = AlertBus::new();
        bus.submit(alert(1, "CriticalTachycardia", 1000)).unwrap();
        bus.submit(alert(1, "CriticalBradycardia", 2000)).unwrap();
        bus.submit(alert(1, "Tachycardia", 3000)).unwrap();

        let counts = bus.count_by_severity();
        assert_eq!(counts.get(&AlertSeverity::Critical), Some(&2));
        assert_eq!(counts.get(&AlertSeverity::Warning), Some(&1));
        assert_eq!(counts.get(&AlertSeverity::Emergency), None);
    }

    #[test]
    fn test_returned_alerts_are_copies() {
        let bus = AlertBus::new();
        bus.submit(alert(1, "TestAlert", 1000)).unwrap();

        let mut copy = bus.all_alerts();
        copy.clear();
        assert_eq!(bus.len(), 1);
    }
}
