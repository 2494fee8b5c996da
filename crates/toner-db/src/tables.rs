use redb::TableDefinition;

/// Table for storing locations.
/// Key: location UUID as bytes
/// Value: serialized Location as bytes
pub const LOCATIONS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("locations");

/// Table for storing printers.
/// Key: printer UUID as bytes
/// Value: serialized Printer as bytes
pub const PRINTERS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("printers");

/// Unique index of printer serial numbers.
/// Key: serial number
/// Value: printer UUID as bytes
pub const PRINTER_SERIALS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("printer_serials");

/// Table for storing consumable models.
/// Key: model UUID as bytes
/// Value: serialized ConsumableModel as bytes
pub const MODELS_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("models");

/// Table for storing consumables.
/// Key: consumable UUID as bytes
/// Value: serialized Consumable as bytes
pub const CONSUMABLES_TABLE: TableDefinition<&[u8], &[u8]> = TableDefinition::new("consumables");

/// Unique index of consumable serial numbers.
/// Key: serial number
/// Value: consumable UUID as bytes
pub const CONSUMABLE_SERIALS_TABLE: TableDefinition<&str, &[u8]> =
    TableDefinition::new("consumable_serials");

/// The operation ledger.
/// Key: global ledger sequence
/// Value: serialized Operation as bytes
pub const OPERATIONS_TABLE: TableDefinition<u64, &[u8]> = TableDefinition::new("operations");

/// Per-consumable index into the ledger.
/// Key: (consumable UUID, sequence) as bytes
/// Value: sequence
pub const HISTORY_TABLE: TableDefinition<&[u8], u64> = TableDefinition::new("history");

/// Counters.
/// Key: counter name
/// Value: last issued value
pub const COUNTERS_TABLE: TableDefinition<&str, u64> = TableDefinition::new("counters");

pub const LEDGER_SEQUENCE: &str = "ledger_sequence";

/// Encode a history key (consumable id, sequence) to bytes.
pub fn encode_history_key(consumable: &[u8; 16], sequence: u64) -> [u8; 24] {
    let mut key = [0u8; 24];
    key[..16].copy_from_slice(consumable);
    key[16..].copy_from_slice(&sequence.to_be_bytes());
    key
}
