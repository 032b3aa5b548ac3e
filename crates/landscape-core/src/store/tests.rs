#![allow(clippy::unwrap_used)]

use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;

use super::{EventHub, LandscapeStore, WorkspaceEvent};
use crate::changelog::ChangeAction;
use crate::command::{Command, CommandResult, MutationContext, MutationOrigin};
use crate::error::CoreError;
use crate::message::CollabMessage;
use crate::model::{EntityId, EntityKind, EntryId, Landscape, LandscapeStructure};
use crate::sender::ChannelSender;

fn structure() -> LandscapeStructure {
    serde_json::from_value(json!({
        "landscapeToken": "t",
        "nodes": [{
            "hostName": "host",
            "ipAddress": "10.0.0.1",
            "applications": [{
                "name": "shop",
                "packages": [{
                    "name": "org",
                    "subPackages": [{ "name": "web", "classes": [{ "name": "Cart" }] }],
                    "classes": [{ "name": "Main" }]
                }]
            }, {
                "name": "billing",
                "packages": [{ "name": "pay", "classes": [{ "name": "Invoice" }] }]
            }]
        }],
        "communications": [{
            "sourceApp": "shop", "sourceClass": "org.Main",
            "targetApp": "shop", "targetClass": "org.web.Cart",
            "operationName": "add"
        }]
    }))
    .unwrap()
}

fn store() -> LandscapeStore {
    LandscapeStore::offline(Landscape::from_structure(&structure()))
}

fn app(store: &LandscapeStore, name: &str) -> EntityId {
    store
        .landscape()
        .applications()
        .find(|a| a.name == name)
        .unwrap()
        .id
        .clone()
}

fn pkg(store: &LandscapeStore, fqn: &str) -> EntityId {
    store
        .landscape()
        .packages()
        .find(|p| p.fqn == fqn)
        .unwrap()
        .id
        .clone()
}

fn class(store: &LandscapeStore, fqn: &str) -> EntityId {
    store
        .landscape()
        .classes()
        .find(|c| c.fqn == fqn)
        .unwrap()
        .id
        .clone()
}

// ── Create / rename ──────────────────────────────────────────────────

#[test]
fn created_package_and_class_form_one_bundle() {
    let mut s = store();
    let shop = app(&s, "shop");
    let p = s.add_package(&shop).unwrap();
    let c = s.add_class(&p).unwrap();

    assert_eq!(s.package(&p).unwrap().name, "newPackage1");
    assert_eq!(s.class(&c).unwrap().fqn, "newPackage1.newClass1");

    let class_entry = s.changelog().last().unwrap().id;
    let bundle = s.changelog().create_bundle(class_entry).unwrap();
    let ids: Vec<_> = bundle.iter().map(|e| e.entity_id.clone()).collect();
    assert_eq!(ids, vec![p.clone(), c.clone()]);

    s.undo(class_entry).unwrap();
    assert!(s.package(&p).is_none());
    assert!(s.class(&c).is_none());
    assert!(s.changelog().is_empty());
    assert!(!s.landscape().live_descendants(&shop).contains(&p));
}

#[test]
fn application_lands_on_the_requested_node() {
    let mut s = store();
    let host = s.landscape().nodes().next().unwrap().id.clone();

    let gateway = s.add_application_on(None, Some("gateway"), "go").unwrap();
    let fresh = s.application(&gateway).unwrap().parent_id.clone();
    assert_ne!(fresh, host);

    let sidecar = s
        .add_application_on(Some(&fresh), Some("sidecar"), "go")
        .unwrap();
    assert_eq!(s.application(&sidecar).unwrap().parent_id, fresh);

    let admin = s.add_application(Some("admin"), "java").unwrap();
    assert_eq!(s.application(&admin).unwrap().parent_id, host);

    let err = s
        .add_application_on(Some(&EntityId::from("nowhere")), None, "java")
        .unwrap_err();
    assert!(matches!(
        err,
        CoreError::NotFound {
            entity_type: EntityKind::Node,
            ..
        }
    ));
}

#[test]
fn rename_round_trip_restores_tree_and_log() {
    let mut s = store();
    let before = s.landscape().clone();
    let org = pkg(&s, "org");

    s.rename_entity(EntityKind::Package, &org, "com").unwrap();
    assert_eq!(s.class(&class(&s, "com.web.Cart")).unwrap().name, "Cart");
    assert_eq!(s.changelog().len(), 1);

    s.rename_entity(EntityKind::Package, &org, "org").unwrap();
    assert_eq!(s.landscape(), &before);
    assert!(s.changelog().is_empty());
}

#[test]
fn rename_of_created_entity_updates_its_create_entry() {
    let mut s = store();
    let shop = app(&s, "shop");
    let p = s.add_package(&shop).unwrap();
    s.rename_entity(EntityKind::Package, &p, "api").unwrap();

    assert_eq!(s.changelog().len(), 1);
    let line: Vec<_> = s.changelog().descriptions().collect();
    assert_eq!(line, vec!["shop: Created package \"api\"".to_owned()]);
}

#[test]
fn rename_to_same_name_is_unchanged() {
    let mut s = store();
    let org = pkg(&s, "org");
    let result = s.rename_entity(EntityKind::Package, &org, "org").unwrap();
    assert_eq!(result, CommandResult::Unchanged);
    assert!(s.changelog().is_empty());
}

#[test]
fn rename_of_missing_entity_is_a_lookup_miss() {
    let mut s = store();
    let err = s
        .rename_entity(EntityKind::Class, &EntityId::from("ghost"), "x")
        .unwrap_err();
    assert!(err.is_lookup_miss());
}

#[test]
fn class_cannot_be_created_in_an_application() {
    let mut s = store();
    let shop = app(&s, "shop");
    let err = s.add_class(&shop).unwrap_err();
    assert_eq!(
        err,
        CoreError::InvalidDestination {
            clipped: EntityKind::Class,
            destination: EntityKind::Application,
        }
    );
}

// ── Delete / restore ─────────────────────────────────────────────────

#[test]
fn deleting_a_class_tombstones_its_edges_separately() {
    let mut s = store();
    let cart = class(&s, "org.web.Cart");
    let edge = s.landscape().communications().next().unwrap().id.clone();

    s.delete_entity(EntityKind::Class, &cart).unwrap();
    assert!(s.class(&cart).is_none());
    assert!(s.communication(&edge).is_none());

    let actions: Vec<_> = s
        .changelog()
        .entries()
        .iter()
        .map(|e| (e.action(), e.entity_type))
        .collect();
    assert_eq!(
        actions,
        vec![
            (ChangeAction::Delete, EntityKind::Class),
            (ChangeAction::Delete, EntityKind::Communication),
        ]
    );

    let class_entry = s.changelog().entries()[0].id;
    s.undo(class_entry).unwrap();
    assert!(s.class(&cart).is_some());
    assert!(s.communication(&edge).is_none());

    let edge_entry = s.changelog().last().unwrap().id;
    s.undo(edge_entry).unwrap();
    assert!(s.communication(&edge).is_some());
}

#[test]
fn deleting_a_package_hides_its_subtree() {
    let mut s = store();
    let org = pkg(&s, "org");
    let cart = class(&s, "org.web.Cart");
    s.delete_entity(EntityKind::Package, &org).unwrap();
    assert!(s.class(&cart).is_none());
    assert!(s.landscape().class(&cart).is_some());

    s.restore_entity(EntityKind::Package, &org, false).unwrap();
    assert!(s.class(&cart).is_some());
}

// ── Paste / cut-insert ───────────────────────────────────────────────

#[test]
fn pasting_a_package_into_itself_is_rejected() {
    let mut s = store();
    let before = s.landscape().clone();
    let org = pkg(&s, "org");
    let err = s.paste(EntityKind::Package, &org, &org).unwrap_err();
    assert!(matches!(err, CoreError::CyclicMove { .. }));

    let web = pkg(&s, "org.web");
    let err = s.paste(EntityKind::Package, &org, &web).unwrap_err();
    assert!(matches!(err, CoreError::CyclicMove { .. }));
    assert_eq!(s.landscape(), &before);
    assert!(s.changelog().is_empty());
}

#[test]
fn paste_copies_subtree_with_unique_name() {
    let mut s = store();
    let web = pkg(&s, "org.web");
    let org = pkg(&s, "org");
    let result = s.paste(EntityKind::Package, &web, &org).unwrap();
    let copy = result.created_id().unwrap().clone();

    let copied = s.package(&copy).unwrap();
    assert_eq!(copied.name, "web-copy");
    assert_eq!(copied.fqn, "org.web-copy");
    assert_eq!(copied.classes.len(), 1);
    assert!(s.package(&web).is_some());
    assert_eq!(s.changelog().len(), 1);
}

#[test]
fn cut_insert_moves_and_undo_cut_moves_back() {
    let mut s = store();
    let cart = class(&s, "org.web.Cart");
    let web = pkg(&s, "org.web");
    let org = pkg(&s, "org");

    s.cut_insert(EntityKind::Class, &cart, &org).unwrap();
    assert_eq!(s.class(&cart).unwrap().fqn, "org.Cart");
    assert!(s.package(&web).unwrap().classes.is_empty());

    let key = s.undo_last().unwrap().unwrap();
    assert_eq!(s.class(&cart).unwrap().fqn, "org.web.Cart");
    assert_eq!(s.class(&cart).unwrap().parent_id, web);

    s.redo(key).unwrap();
    assert_eq!(s.class(&cart).unwrap().parent_id, org);
    assert_eq!(s.changelog().len(), 1);
}

#[test]
fn cut_insert_into_own_descendant_is_rejected() {
    let mut s = store();
    let org = pkg(&s, "org");
    let web = pkg(&s, "org.web");
    let err = s.cut_insert(EntityKind::Package, &org, &web).unwrap_err();
    assert!(matches!(err, CoreError::CyclicMove { .. }));
    assert_eq!(s.package(&org).unwrap().sub_packages, vec![web]);
}

#[test]
fn cut_insert_into_deleted_destination_leaves_source() {
    let mut s = store();
    let cart = class(&s, "org.web.Cart");
    let pay = pkg(&s, "pay");
    s.delete_entity(EntityKind::Package, &pay).unwrap();

    let err = s.cut_insert(EntityKind::Class, &cart, &pay).unwrap_err();
    assert_eq!(err, CoreError::DestinationGone { destination: pay });
    assert_eq!(s.class(&cart).unwrap().fqn, "org.web.Cart");
}

#[test]
fn undo_cut_into_tombstoned_origin_leaves_entity() {
    let mut s = store();
    let cart = class(&s, "org.web.Cart");
    let web = pkg(&s, "org.web");
    let pay = pkg(&s, "pay");
    s.cut_insert(EntityKind::Class, &cart, &pay).unwrap();
    s.delete_entity(EntityKind::Package, &web).unwrap();
    let before = s.landscape().clone();

    let err = s.restore_entity(EntityKind::Class, &cart, true).unwrap_err();
    assert_eq!(err, CoreError::DestinationGone { destination: web });
    assert_eq!(s.landscape(), &before);
    assert_eq!(s.class(&cart).unwrap().parent_id, pay);
}

#[test]
fn undo_cut_that_would_close_a_cycle_is_rejected() {
    let mut s = store();
    let org = pkg(&s, "org");
    let web = pkg(&s, "org.web");
    let pay = pkg(&s, "pay");

    // web leaves org, then org moves under web: web's old parent is now
    // its own descendant.
    s.cut_insert(EntityKind::Package, &web, &pay).unwrap();
    let web_move = s.changelog().last().unwrap().id;
    s.cut_insert(EntityKind::Package, &org, &web).unwrap();
    let before = s.landscape().clone();

    let err = s.restore_entity(EntityKind::Package, &web, true).unwrap_err();
    assert!(matches!(err, CoreError::CyclicMove { .. }));
    assert_eq!(s.landscape(), &before);

    // Undoing the move is best effort: the entry is stashed, the tree
    // stays as it was.
    s.undo(web_move).unwrap();
    assert_eq!(s.landscape(), &before);
    assert_eq!(s.package(&web).unwrap().parent_id, pay);
    assert_eq!(s.package(&org).unwrap().parent_id, web);
    assert!(s.landscape().is_live(&org));
}

#[test]
fn moving_a_class_across_applications_repoints_edges() {
    let mut s = store();
    let cart = class(&s, "org.web.Cart");
    let pay = pkg(&s, "pay");
    let billing = app(&s, "billing");
    s.cut_insert(EntityKind::Class, &cart, &pay).unwrap();

    assert_eq!(s.class(&cart).unwrap().app_id, billing);
    let edge = s.landscape().communications().next().unwrap();
    assert_eq!(edge.target_app_id, billing);
}

// ── Duplicate ────────────────────────────────────────────────────────

#[test]
fn duplicate_application_is_deterministic_and_copies_edges() {
    let mut a = store();
    let mut b = store();
    let shop = app(&a, "shop");

    let copy_a = a.duplicate_application(&shop).unwrap();
    let copy_b = b.duplicate_application(&shop).unwrap();
    assert_eq!(copy_a, copy_b);
    assert_eq!(a.landscape(), b.landscape());

    assert_eq!(a.application(&copy_a).unwrap().name, "shop-copy");
    assert_eq!(a.landscape().communications().count(), 2);
    assert_eq!(a.changelog().len(), 1);
    assert_eq!(a.changelog().entries()[0].entity_type, EntityKind::Application);
}

// ── Communication ────────────────────────────────────────────────────

#[test]
fn adding_the_same_edge_twice_yields_one_edge() {
    let mut s = store();
    let invoice = class(&s, "pay.Invoice");
    let main = class(&s, "org.Main");

    let first = s.add_communication(&main, &invoice, "bill").unwrap();
    let second = s.add_communication(&main, &invoice, "bill").unwrap();
    assert!(matches!(first, CommandResult::Created(_)));
    assert_eq!(second, CommandResult::Unchanged);
    assert_eq!(s.landscape().communications().count(), 2);
    assert_eq!(s.changelog().len(), 1);
}

#[test]
fn reverse_edge_marks_bidirectional() {
    let mut s = store();
    let main = class(&s, "org.Main");
    let cart = class(&s, "org.web.Cart");
    s.add_communication(&cart, &main, "back").unwrap();
    let edge = s.landscape().communications().next().unwrap();
    assert!(edge.is_bidirectional);
    assert_eq!(s.landscape().communications().count(), 1);
}

#[test]
fn operation_rename_round_trips() {
    let mut s = store();
    let edge = s.landscape().communications().next().unwrap().id.clone();
    s.rename_entity(EntityKind::Communication, &edge, "put").unwrap();
    assert_eq!(s.communication(&edge).unwrap().operation_name, "put");
    s.undo_last().unwrap();
    assert_eq!(s.communication(&edge).unwrap().operation_name, "add");
}

// ── Broadcast boundary ───────────────────────────────────────────────

#[test]
fn only_local_changes_are_broadcast() {
    let (sender, mut rx) = ChannelSender::new();
    let mut s = LandscapeStore::new(
        Landscape::from_structure(&structure()),
        Arc::new(sender),
        EventHub::default(),
    );
    let org = pkg(&s, "org");

    s.rename_entity(EntityKind::Package, &org, "com").unwrap();
    assert!(matches!(
        rx.try_recv().unwrap(),
        CollabMessage::RestructureRename(_)
    ));

    let remote = Command::Rename {
        kind: EntityKind::Package,
        id: org.clone(),
        new_name: "net".into(),
        entry_id: EntryId::fresh(),
    };
    s.execute(remote, MutationContext::REMOTE).unwrap();
    assert!(rx.try_recv().is_err());

    s.rename_entity(EntityKind::Package, &org, "net").unwrap();
    assert!(rx.try_recv().is_err());
}

#[test]
fn undo_broadcasts_inverse_then_changelog_removal() {
    let (sender, mut rx) = ChannelSender::new();
    let mut s = LandscapeStore::new(
        Landscape::from_structure(&structure()),
        Arc::new(sender),
        EventHub::default(),
    );
    let shop = app(&s, "shop");
    s.add_package(&shop).unwrap();
    let _ = rx.try_recv().unwrap();

    s.undo_last().unwrap();
    match rx.try_recv().unwrap() {
        CollabMessage::RestructureCreateOrDelete(m) => assert!(m.undo),
        other => panic!("unexpected {other:?}"),
    }
    assert!(matches!(
        rx.try_recv().unwrap(),
        CollabMessage::ChangelogRemoveEntry(_)
    ));
}

#[test]
fn mutations_publish_workspace_events() {
    let mut s = store();
    let mut events = s.events().subscribe();
    let org = pkg(&s, "org");
    s.rename_entity(EntityKind::Package, &org, "com").unwrap();
    assert_eq!(
        events.try_recv().unwrap(),
        WorkspaceEvent::Mutated {
            command: "rename",
            target: Some(org),
            origin: MutationOrigin::Local,
        }
    );
    assert_eq!(s.events().version(), 1);
}

// ── Redo stash ───────────────────────────────────────────────────────

#[test]
fn evicted_stash_purges_undone_creations() {
    let mut s = LandscapeStore::with_max_stashes(
        Landscape::from_structure(&structure()),
        Arc::new(crate::sender::OfflineSender),
        EventHub::default(),
        1,
    );
    let shop = app(&s, "shop");
    let first = s.add_package(&shop).unwrap();
    s.undo_last().unwrap();
    assert!(s.landscape().package(&first).is_some());

    let second = s.add_package(&shop).unwrap();
    s.undo_last().unwrap();
    assert!(s.landscape().package(&first).is_none());
    assert!(s.landscape().package(&second).is_some());
}

#[test]
fn clear_changelog_purges_tombstones() {
    let mut s = store();
    let main = class(&s, "org.Main");
    s.delete_entity(EntityKind::Class, &main).unwrap();
    s.clear_changelog();
    assert!(s.changelog().is_empty());
    assert!(s.landscape().class(&main).is_none());
    assert_eq!(s.landscape().communications().count(), 0);
}

#[test]
fn redo_last_reapplies_latest_undo() {
    let mut s = store();
    assert!(!s.redo_last().unwrap());

    let org = pkg(&s, "org");
    s.rename_entity(EntityKind::Package, &org, "com").unwrap();
    let renamed = s.landscape().clone();
    s.undo_last().unwrap();
    assert_eq!(s.package(&org).unwrap().name, "org");

    assert!(s.redo_last().unwrap());
    assert_eq!(s.landscape(), &renamed);
    assert!(!s.redo_last().unwrap());
}

#[test]
fn redo_unknown_key_fails() {
    let mut s = store();
    let err = s.redo(crate::model::RestoreKey::fresh()).unwrap_err();
    assert!(matches!(err, CoreError::StashNotFound { .. }));
}
