//! Factory reset handling for `/a/sen` and `POST /.well-known/knx` reset codes.

use knx_storage::Storage;
use knx_types::ResetCode;

const LOAD_STATE_KEY: &str = "LOAD_STATE";
const INDIVIDUAL_ADDRESS_KEY: &str = "IA";

/// Erase persisted state per the requested reset code and return the
/// device to `LoadState::Unloaded`.
///
/// - `Full`: every Group Object / Recipient-Publisher Table slot, plus the
///   individual address.
/// - `IndividualAddressOnly`: the individual address alone; routing tables
///   survive.
/// - `ConfigKeepCredentials`: every routing table slot, but the individual
///   address and any provisioned OSCORE credentials survive.
pub fn factory_reset(storage: &dyn Storage, code: ResetCode) -> knx_storage::Result<()> {
    match code {
        ResetCode::Full => {
            erase_table_slots(storage, "GOT_STORE")?;
            erase_table_slots(storage, "RPT_STORE")?;
            storage.erase(INDIVIDUAL_ADDRESS_KEY)?;
        }
        ResetCode::IndividualAddressOnly => {
            storage.erase(INDIVIDUAL_ADDRESS_KEY)?;
        }
        ResetCode::ConfigKeepCredentials => {
            erase_table_slots(storage, "GOT_STORE")?;
            erase_table_slots(storage, "RPT_STORE")?;
        }
    }
    storage.erase(LOAD_STATE_KEY)?;
    tracing::info!(?code, "factory reset complete");
    Ok(())
}

fn erase_table_slots(storage: &dyn Storage, prefix: &str) -> knx_storage::Result<()> {
    for key in storage.keys_with_prefix(prefix)? {
        storage.erase(&key)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use knx_storage::MemoryStorage;

    #[test]
    fn full_reset_clears_tables_and_address() {
        let storage = MemoryStorage::default();
        storage.write("GOT_STORE_0", b"x").expect("write");
        storage.write("RPT_STORE_0", b"y").expect("write");
        storage.write(INDIVIDUAL_ADDRESS_KEY, b"\x11\x01").expect("write");

        factory_reset(&storage, ResetCode::Full).expect("reset");

        assert_eq!(storage.read("GOT_STORE_0").expect("read"), None);
        assert_eq!(storage.read("RPT_STORE_0").expect("read"), None);
        assert_eq!(storage.read(INDIVIDUAL_ADDRESS_KEY).expect("read"), None);
    }

    #[test]
    fn individual_address_only_reset_keeps_tables() {
        let storage = MemoryStorage::default();
        storage.write("GOT_STORE_0", b"x").expect("write");
        storage.write(INDIVIDUAL_ADDRESS_KEY, b"\x11\x01").expect("write");

        factory_reset(&storage, ResetCode::IndividualAddressOnly).expect("reset");

        assert_eq!(storage.read("GOT_STORE_0").expect("read"), Some(b"x".to_vec()));
        assert_eq!(storage.read(INDIVIDUAL_ADDRESS_KEY).expect("read"), None);
    }

    #[test]
    fn config_keep_credentials_clears_tables_but_keeps_address() {
        let storage = MemoryStorage::default();
        storage.write("GOT_STORE_0", b"x").expect("write");
        storage.write(INDIVIDUAL_ADDRESS_KEY, b"\x11\x01").expect("write");

        factory_reset(&storage, ResetCode::ConfigKeepCredentials).expect("reset");

        assert_eq!(storage.read("GOT_STORE_0").expect("read"), None);
        assert_eq!(
            storage.read(INDIVIDUAL_ADDRESS_KEY).expect("read"),
            Some(b"\x11\x01".to_vec())
        );
    }
}
