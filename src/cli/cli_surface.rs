use super::cli_main::{get_user_input, prompt};
use crate::library_manager::{with_database_manager, with_database_manager_mut};
use crate::Surface::metal_database::MetalDatabase;
use std::io::{self, Write};

pub fn surface_menu() {
    let mut db = MetalDatabase::new();
    match db.load_default() {
        Ok(()) => println!("Loaded {} entries", db.surface().len()),
        Err(e) => println!("\x1b[31mCould not load the configured database: {}\x1b[0m", e),
    }
    loop {
        let directory = with_database_manager(|m| m.database_directory().to_string());
        println!("\n=== Metal surface database ({}) ===", directory);
        println!("1. Show all entries");
        println!("2. Binding energies by label");
        println!("3. Entries on a metal");
        println!("4. Best match for metal/facet");
        println!("5. Change database directory");
        println!("6. Save database to directory");
        println!("0. Back to main menu");
        print!("Enter your choice: ");
        let _ = io::stdout().flush();

        let Some(choice) = get_user_input() else {
            break;
        };
        match choice.trim() {
            "1" => db.surface().pretty_print(),
            "2" => {
                let Some(label) = prompt("Label (e.g. Pt111): ") else { break };
                match (db.get_binding_energies(&label), db.get_surface_site_density(&label)) {
                    (Ok(be), Ok(density)) => {
                        for (element, q) in be {
                            println!("  {}: {}", element, q);
                        }
                        match density {
                            Some(q) => println!("  site density: {}", q),
                            None => println!("  site density: not given"),
                        }
                    }
                    (Err(e), _) | (_, Err(e)) => println!("{}", e),
                }
            }
            "3" => {
                let Some(metal) = prompt("Metal (e.g. Pt): ") else { break };
                match db.get_all_entries_on_metal(&metal) {
                    Ok(labels) => println!("  {}", labels.join(", ")),
                    Err(e) => println!("{}", e),
                }
            }
            "4" => {
                let Some(query) = prompt("Metal and optional facet (e.g. Pt or Pt111): ") else {
                    break;
                };
                match db.find_binding_energies(&query) {
                    Ok(energies) => {
                        for (element, energy) in energies {
                            println!("  {}: {}", element, energy);
                        }
                    }
                    Err(e) => println!("{}", e),
                }
            }
            "5" => {
                let Some(path) = prompt("Database directory: ") else { break };
                match with_database_manager_mut(|m| m.set_database_directory(&path)) {
                    Ok(()) => match db.load_default() {
                        Ok(()) => println!("Loaded {} entries", db.surface().len()),
                        Err(e) => println!("{}", e),
                    },
                    Err(e) => println!("{}", e),
                }
            }
            "6" => {
                let Some(path) = prompt("Target directory: ") else { break };
                match db.save(&path) {
                    Ok(()) => println!("Saved to {}", path),
                    Err(e) => println!("{}", e),
                }
            }
            "0" => break,
            _ => println!("Invalid choice. Please try again."),
        }
    }
}
