use super::store::{InstanceId, Owner};
use smallvec::SmallVec;
use smartstring::alias::String as SmartString;
use std::collections::{BTreeMap, BTreeSet, HashMap};

/// What one observer read: owner -> field names
type Reads = BTreeMap<Owner, BTreeSet<SmartString>>;

/// Tracks which component instances read which state fields.
///
/// Reads made during a hook pass are recorded as pending and only become
/// subscriptions when the observer commits them.
#[derive(Default)]
pub struct ObserverGraph {
    /// For each (owner, field): who gets notified when it is written
    by_field: HashMap<(Owner, SmartString), SmallVec<[InstanceId; 4]>>,
    committed: HashMap<InstanceId, Reads>,
    pending: HashMap<InstanceId, Reads>,
}

impl ObserverGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Remember that `observer` read `owner.name` during the current pass
    pub fn record(&mut self, observer: InstanceId, owner: &Owner, name: &str) {
        self.pending
            .entry(observer)
            .or_default()
            .entry(owner.clone())
            .or_default()
            .insert(name.into());
    }

    /// Replace the observer's subscriptions with the reads recorded since the
    /// last commit
    pub fn commit(&mut self, observer: InstanceId) {
        self.unsubscribe_all(observer);
        let reads = self.pending.remove(&observer).unwrap_or_default();

        for (owner, names) in &reads {
            for name in names {
                let subscribers = self
                    .by_field
                    .entry((owner.clone(), name.clone()))
                    .or_default();
                if !subscribers.contains(&observer) {
                    subscribers.push(observer);
                }
            }
        }
        self.committed.insert(observer, reads);
    }

    pub fn observers_of(&self, owner: &Owner, name: &str) -> &[InstanceId] {
        self.by_field
            .get(&(owner.clone(), SmartString::from(name)))
            .map(|subscribers| subscribers.as_slice())
            .unwrap_or(&[])
    }

    /// Drop everything known about `observer`
    pub fn clear_for(&mut self, observer: InstanceId) {
        self.unsubscribe_all(observer);
        self.pending.remove(&observer);
    }

    /// Drop every subscription to fields of `owner`, committed or pending
    pub fn forget_owner(&mut self, owner: &Owner) {
        self.by_field.retain(|(field_owner, _), _| field_owner != owner);
        for reads in self.committed.values_mut().chain(self.pending.values_mut()) {
            reads.remove(owner);
        }
    }

    fn unsubscribe_all(&mut self, observer: InstanceId) {
        let Some(reads) = self.committed.remove(&observer) else {
            return;
        };
        for (owner, names) in reads {
            for name in names {
                let key = (owner.clone(), name);
                if let Some(subscribers) = self.by_field.get_mut(&key) {
                    subscribers.retain(|s| *s != observer);
                    if subscribers.is_empty() {
                        self.by_field.remove(&key);
                    }
                }
            }
        }
    }
}
