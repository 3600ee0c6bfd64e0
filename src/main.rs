use bevy::app::ScheduleRunnerPlugin;
use bevy::prelude::*;

use schematic_undo::SchematicUndoPlugin;
use schematic_undo::library::{Libraries, LibraryReloaded};

/// Print what was loaded from the library directory
fn report_libraries(mut events: MessageReader<LibraryReloaded>, libraries: Res<Libraries>) {
    for event in events.read() {
        let model = &libraries.0;
        info!(
            "Library directory {:?} (generation {})",
            model.library_dir(),
            event.generation
        );
        for library in model.all_libraries() {
            let macros: usize = library
                .all_categories()
                .iter()
                .map(|c| c.all_macros().len())
                .sum();
            info!(
                "  {} [{}] {} categories, {} macros{}",
                library.name(),
                library.filename(),
                library.all_categories().len(),
                macros,
                if library.is_std_lib() { ", standard" } else { "" }
            );
        }
    }
}

fn main() {
    if let Err(e) = schematic_undo::paths::ensure_directories() {
        eprintln!("Failed to create data directories: {}", e);
    }

    // Keep the guard alive for the duration of the program
    let _log_guard = schematic_undo::logging::setup_logging(&schematic_undo::paths::logs_dir());

    App::new()
        .add_plugins(MinimalPlugins.set(ScheduleRunnerPlugin::run_once()))
        .add_plugins(SchematicUndoPlugin)
        .add_systems(Update, report_libraries.run_if(on_message::<LibraryReloaded>))
        .run();
}
