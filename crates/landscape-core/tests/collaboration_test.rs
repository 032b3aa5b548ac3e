#![allow(clippy::unwrap_used)]
// Two participants exchanging messages through the dispatcher.

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use tokio::sync::mpsc::UnboundedReceiver;

use landscape_core::message::{ChangelogRestoreMessage, RestoreMessage};
use landscape_core::{
    ChannelSender, CollabMessage, Command, CreateApplicationRequest, CreateEntityRequest,
    DispatchOutcome, Dispatcher, EntityId, EntityKind, EntryId, Envelope, EventHub, Landscape,
    LandscapeStructure, MutationContext, NodeRef, RestoreKey, Workspace,
};

fn structure() -> LandscapeStructure {
    serde_json::from_value(json!({
        "landscapeToken": "shared",
        "nodes": [{
            "hostName": "host",
            "ipAddress": "10.0.0.1",
            "applications": [{
                "name": "shop",
                "packages": [{
                    "name": "org",
                    "classes": [{ "name": "Main" }, { "name": "Cart" }]
                }]
            }]
        }]
    }))
    .unwrap()
}

struct Peer {
    name: &'static str,
    workspace: Workspace,
    dispatcher: Dispatcher,
    outbox: UnboundedReceiver<CollabMessage>,
}

impl Peer {
    fn new(name: &'static str) -> Self {
        let (sender, outbox) = ChannelSender::new();
        let workspace = Workspace::new(
            Landscape::from_structure(&structure()),
            Arc::new(sender),
            EventHub::default(),
        );
        let mut dispatcher = Dispatcher::new();
        dispatcher.attach();
        Self {
            name,
            workspace,
            dispatcher,
            outbox,
        }
    }

    fn sent(&mut self) -> Vec<Envelope> {
        let mut out = Vec::new();
        while let Ok(message) = self.outbox.try_recv() {
            out.push(Envelope::new(self.name, message));
        }
        out
    }

    fn receive(&mut self, envelopes: &[Envelope]) -> Vec<DispatchOutcome> {
        envelopes
            .iter()
            .map(|e| self.dispatcher.dispatch(&mut self.workspace, e))
            .collect()
    }

    fn entry_ids(&self) -> Vec<EntryId> {
        self.workspace
            .store()
            .changelog()
            .entries()
            .iter()
            .map(|e| e.id)
            .collect()
    }

    fn package(&self, fqn: &str) -> EntityId {
        self.workspace
            .store()
            .landscape()
            .packages()
            .find(|p| p.fqn == fqn)
            .unwrap()
            .id
            .clone()
    }

    fn class(&self, fqn: &str) -> EntityId {
        self.workspace
            .store()
            .landscape()
            .classes()
            .find(|c| c.fqn == fqn)
            .unwrap()
            .id
            .clone()
    }
}

fn restore(id: &EntityId, undo_cut: bool) -> RestoreMessage {
    RestoreMessage {
        entity_id: id.clone(),
        undo_cut_operation: undo_cut,
        undo: true,
    }
}

#[test]
fn remote_rename_updates_name_and_fqn() {
    let mut peer = Peer::new("b");
    let store = peer.workspace.store_mut();
    let node = NodeRef::for_new_application("demo");
    store
        .execute(
            Command::CreateApplication(CreateApplicationRequest {
                id: EntityId::from("app1"),
                name: "demo".into(),
                language: "java".into(),
                node,
                entry_id: EntryId::fresh(),
            }),
            MutationContext::REMOTE,
        )
        .unwrap();
    store
        .execute(
            Command::CreatePackage(CreateEntityRequest {
                id: EntityId::from("pkg1"),
                parent_id: EntityId::from("app1"),
                name: "pkg1".into(),
                entry_id: EntryId::fresh(),
            }),
            MutationContext::REMOTE,
        )
        .unwrap();

    let envelope: Envelope = serde_json::from_value(json!({
        "userId": "a",
        "originalMessage": {
            "event": "restructure_rename",
            "entityType": "PACKAGE",
            "entityId": "pkg1",
            "newName": "pkg1-renamed",
            "undo": false
        }
    }))
    .unwrap();
    assert_eq!(peer.receive(&[envelope]), vec![DispatchOutcome::Applied]);

    let pkg = peer
        .workspace
        .store()
        .package(&EntityId::from("pkg1"))
        .unwrap();
    assert_eq!(pkg.name, "pkg1-renamed");
    assert_eq!(pkg.fqn, "pkg1-renamed");
    assert!(peer.sent().is_empty(), "remote mutations are not rebroadcast");
}

#[test]
fn echoed_messages_leave_state_unchanged() {
    let mut a = Peer::new("a");
    let mut b = Peer::new("b");
    let org = a.package("org");
    let main = a.class("org.Main");
    let cart = a.class("org.Cart");

    let store = a.workspace.store_mut();
    let pkg = store.add_package(&org).unwrap();
    store.add_class(&pkg).unwrap();
    store.rename_entity(EntityKind::Package, &pkg, "api").unwrap();
    store.add_communication(&main, &cart, "checkout").unwrap();
    let sent = a.sent();
    assert_eq!(sent.len(), 4);

    assert!(b.receive(&sent).iter().all(|o| *o == DispatchOutcome::Applied));
    let landscape = b.workspace.store().landscape().clone();
    let entries = b.entry_ids();

    assert!(b.receive(&sent).iter().all(|o| *o != DispatchOutcome::Applied));
    assert_eq!(b.workspace.store().landscape(), &landscape);
    assert_eq!(b.entry_ids(), entries);

    // The sender's own message fed back to itself is a no-op too.
    let before = a.workspace.store().landscape().clone();
    a.receive(&sent);
    assert_eq!(a.workspace.store().landscape(), &before);
}

#[test]
fn peers_converge_through_undo_and_redo() {
    let mut a = Peer::new("a");
    let mut b = Peer::new("b");
    let org = a.package("org");

    let pkg = a.workspace.store_mut().add_package(&org).unwrap();
    a.workspace.store_mut().add_class(&pkg).unwrap();
    b.receive(&a.sent());
    assert_eq!(a.workspace.store().landscape(), b.workspace.store().landscape());
    assert_eq!(a.entry_ids(), b.entry_ids());

    let key = a.workspace.store_mut().undo_last().unwrap().unwrap();
    let undo = a.sent();
    assert!(matches!(
        undo.last().unwrap().original_message,
        CollabMessage::ChangelogRemoveEntry(_)
    ));
    b.receive(&undo);
    assert!(b.workspace.store().package(&pkg).is_none());
    assert!(b.workspace.store().changelog().is_empty());
    assert!(b.workspace.store().changelog().stash(key).is_some());
    assert_eq!(a.workspace.store().landscape(), b.workspace.store().landscape());

    a.workspace.store_mut().redo(key).unwrap();
    b.receive(&a.sent());
    assert!(b.workspace.store().package(&pkg).is_some());
    assert_eq!(a.entry_ids(), b.entry_ids());
    assert_eq!(a.workspace.store().landscape(), b.workspace.store().landscape());
}

#[test]
fn racing_delete_turns_rename_into_rejection() {
    let mut a = Peer::new("a");
    let mut b = Peer::new("b");
    let org = a.package("org");

    b.workspace
        .store_mut()
        .delete_entity(EntityKind::Package, &org)
        .unwrap();
    a.workspace
        .store_mut()
        .rename_entity(EntityKind::Package, &org, "core")
        .unwrap();

    assert_eq!(b.receive(&a.sent()), vec![DispatchOutcome::Rejected]);
    assert!(b.workspace.store().package(&org).is_none());
}

#[test]
fn detached_dispatcher_drops_without_queueing() {
    let mut a = Peer::new("a");
    let mut b = Peer::new("b");
    let org = a.package("org");
    a.workspace
        .store_mut()
        .rename_entity(EntityKind::Package, &org, "core")
        .unwrap();
    let sent = a.sent();

    b.dispatcher.detach();
    assert_eq!(b.receive(&sent), vec![DispatchOutcome::Dropped]);
    b.dispatcher.attach();
    assert_eq!(b.workspace.store().package(&org).unwrap().name, "org");
    assert_eq!(b.receive(&sent), vec![DispatchOutcome::Applied]);
}

#[test]
fn remote_restores_apply_once_and_reject_bad_targets() {
    let mut a = Peer::new("a");
    let mut b = Peer::new("b");
    let org = a.package("org");
    let cart = a.class("org.Cart");
    a.workspace
        .store_mut()
        .delete_entity(EntityKind::Package, &org)
        .unwrap();
    b.receive(&a.sent());
    assert!(b.workspace.store().package(&org).is_none());

    let revive = Envelope::new("a", CollabMessage::RestructureRestorePackage(restore(&org, false)));
    assert_eq!(b.receive(&[revive.clone()]), vec![DispatchOutcome::Applied]);
    assert!(b.workspace.store().package(&org).is_some());
    assert_eq!(b.receive(&[revive]), vec![DispatchOutcome::Unchanged]);

    let before = b.workspace.store().landscape().clone();
    let entries = b.entry_ids();
    let rejected = [
        CollabMessage::RestructureRestoreApp(restore(&EntityId::from("ghost"), false)),
        // Kind must match the entity.
        CollabMessage::RestructureRestoreClass(restore(&org, false)),
        CollabMessage::RestructureRestoreApp(restore(&cart, false)),
        CollabMessage::ChangelogRestoreEntries(ChangelogRestoreMessage {
            key: RestoreKey::fresh(),
        }),
    ]
    .map(|message| Envelope::new("a", message));
    assert!(b.receive(&rejected).iter().all(|o| *o == DispatchOutcome::Rejected));
    assert_eq!(b.workspace.store().landscape(), &before);
    assert_eq!(b.entry_ids(), entries);
}

#[test]
fn remote_undo_cut_closing_a_cycle_is_rejected() {
    let mut a = Peer::new("a");
    let mut b = Peer::new("b");
    let org = a.package("org");

    let store = a.workspace.store_mut();
    let outer = store.add_package(&org).unwrap();
    let inner = store.add_package(&outer).unwrap();
    // inner remembers `outer`; then outer moves below inner.
    store.cut_insert(EntityKind::Package, &inner, &org).unwrap();
    store.cut_insert(EntityKind::Package, &outer, &inner).unwrap();
    b.receive(&a.sent());
    assert_eq!(a.workspace.store().landscape(), b.workspace.store().landscape());

    let before = b.workspace.store().landscape().clone();
    let undo_cut = Envelope::new(
        "a",
        CollabMessage::RestructureRestorePackage(restore(&inner, true)),
    );
    assert_eq!(b.receive(&[undo_cut]), vec![DispatchOutcome::Rejected]);
    assert_eq!(b.workspace.store().landscape(), &before);
    assert_eq!(b.workspace.store().package(&outer).unwrap().parent_id, inner);
}
