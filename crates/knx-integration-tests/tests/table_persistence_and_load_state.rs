//! End-to-end: Group Object Table and Recipient/Publisher Table entries
//! written during one process lifetime survive a simulated restart (a
//! fresh table instance reloading from the same storage backend), and
//! mutation is refused outside the `Loading` device state at every layer.

use knx_groups::rpt::{PublisherEntry, PublisherTarget, RecipientPublisherTable};
use knx_groups::{GroupObjectEntry, GroupObjectTable, GroupsError};
use knx_storage::SqliteStorage;
use knx_types::LoadState;

#[test]
fn group_object_table_survives_a_simulated_restart() {
    let storage = SqliteStorage::open_memory().expect("open sqlite");

    {
        let mut got = GroupObjectTable::new(20);
        got.create_or_update(
            GroupObjectEntry {
                id: 1,
                href: "/fp/r/1".into(),
                ga: vec![5, 6],
                cflags: knx_groups::CommFlags::WRITE,
            },
            LoadState::Loading,
            &storage,
        )
        .expect("create entry before restart");
    }

    // Simulate a process restart: a brand new table, same storage.
    let mut reloaded = GroupObjectTable::new(20);
    reloaded.reload(&storage).expect("reload");

    let entry = reloaded.entry(1).expect("entry survives restart");
    assert_eq!(entry.href, "/fp/r/1");
    assert_eq!(entry.ga, vec![5, 6]);
}

#[test]
fn recipient_publisher_table_survives_a_simulated_restart() {
    let storage = SqliteStorage::open_memory().expect("open sqlite");

    {
        let mut rpt = RecipientPublisherTable::new(20);
        rpt.create_or_update(
            PublisherEntry {
                id: 9,
                ga: 42,
                target: PublisherTarget::Unicast { ia: 0x1203, path: "/fp/r/9".into() },
            },
            LoadState::Loading,
            &storage,
        )
        .expect("create entry before restart");
    }

    let mut reloaded = RecipientPublisherTable::new(20);
    reloaded.reload(&storage).expect("reload");

    let entry = reloaded.entry(9).expect("entry survives restart");
    assert_eq!(entry.ga, 42);
}

#[test]
fn routing_table_mutation_is_gated_on_loading_state_across_both_tables() {
    let storage = SqliteStorage::open_memory().expect("open sqlite");
    let mut got = GroupObjectTable::new(20);
    let mut rpt = RecipientPublisherTable::new(20);

    let entry = GroupObjectEntry {
        id: 1,
        href: "/fp/r/1".into(),
        ga: vec![1],
        cflags: knx_groups::CommFlags::WRITE,
    };
    assert_eq!(
        got.create_or_update(entry.clone(), LoadState::Unloaded, &storage),
        Err(GroupsError::NotLoading)
    );
    assert_eq!(
        got.create_or_update(entry.clone(), LoadState::Loaded, &storage),
        Err(GroupsError::NotLoading)
    );
    got.create_or_update(entry, LoadState::Loading, &storage)
        .expect("mutation accepted while loading");

    let publisher = PublisherEntry {
        id: 1,
        ga: 1,
        target: PublisherTarget::Unicast { ia: 0x1101, path: "/fp/r/1".into() },
    };
    assert_eq!(
        rpt.create_or_update(publisher.clone(), LoadState::Loaded, &storage),
        Err(GroupsError::NotLoading)
    );
    rpt.create_or_update(publisher, LoadState::Loading, &storage)
        .expect("mutation accepted while loading");
}
