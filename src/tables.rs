use comfy_table::{Attribute, Cell, CellAlignment, Color, Table, modifiers, presets};

use crate::{
    api::growatt::Plant,
    entity::{EntityRegistry, UNKNOWN_STATE},
    integration::SupportedDevice,
};

fn new_table() -> Table {
    let mut table = Table::new();
    table.load_preset(presets::UTF8_FULL_CONDENSED).apply_modifier(modifiers::UTF8_ROUND_CORNERS);
    table.enforce_styling();
    table
}

pub fn build_plants_table(plants: &[Plant]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["ID", "Name", "City"]);
    for plant in plants {
        table.add_row(vec![
            Cell::new(plant.id).set_alignment(CellAlignment::Right),
            Cell::new(&plant.name).add_attribute(Attribute::Bold),
            Cell::new(plant.city.as_deref().unwrap_or_default()),
        ]);
    }
    table
}

pub fn build_devices_table(devices: &[SupportedDevice]) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Serial number", "Family", "Type", "Model"]);
    for device in devices {
        table.add_row(vec![
            Cell::new(&device.serial_number).add_attribute(Attribute::Bold),
            Cell::new(device.family),
            Cell::new(device.family.device_type().code()).set_alignment(CellAlignment::Right),
            Cell::new(device.model.as_deref().unwrap_or_default()).add_attribute(Attribute::Dim),
        ]);
    }
    table
}

pub fn build_entities_table(registry: &EntityRegistry, device_id: &str) -> Table {
    let mut table = new_table();
    table.set_header(vec!["Entity ID", "State", "Unit"]);
    for entry in registry.device_entries(device_id) {
        let state = entry.state();
        let state_cell = Cell::new(&state).set_alignment(CellAlignment::Right);
        table.add_row(vec![
            Cell::new(&entry.entity_id),
            match state.as_str() {
                UNKNOWN_STATE => state_cell.add_attribute(Attribute::Dim),
                "on" => state_cell.fg(Color::Green),
                "off" => state_cell.fg(Color::Red),
                _ => state_cell,
            },
            Cell::new(entry.entity.unit().unwrap_or_default()).add_attribute(Attribute::Dim),
        ]);
    }
    table
}
