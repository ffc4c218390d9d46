use crate::Surface::metal_database::MetalDatabase;
use crate::Surface::metal_library::MetalLibrary;
use log::error;

pub fn surface_examples(surftask: usize) {
    //
    match surftask {
        0 => {
            // load the database shipped with the crate and show what is inside
            let mut db = MetalDatabase::new();
            if let Err(e) = db.load("database/surface") {
                error!("{}", e);
                return;
            }
            println!("Library: {}", db.surface().name);
            db.surface().pretty_print();
            for metal in ["Pt", "Ni", "Co"] {
                match db.get_all_entries_on_metal(metal) {
                    Ok(labels) => println!("{} facets: {:?}", metal, labels),
                    Err(e) => println!("{}", e),
                }
            }
        }
        1 => {
            // exact lookups vs. best-effort resolution
            let mut db = MetalDatabase::new();
            if let Err(e) = db.load("database/surface") {
                error!("{}", e);
                return;
            }
            match db.get_binding_energies("Pt111") {
                Ok(be) => println!("Pt111 as stored: {:?}", be),
                Err(e) => println!("{}", e),
            }
            match db.get_surface_site_density("Pt111") {
                Ok(density) => println!("Pt111 site density: {:?}", density),
                Err(e) => println!("{}", e),
            }
            for query in ["Pt111", "Pt211", "Ni", "Au"] {
                match db.find_binding_energies(query) {
                    Ok(energies) => {
                        println!("\n{}:", query);
                        for (element, energy) in energies {
                            println!(
                                "  {}: {} ({:.4} kJ/mol)",
                                element,
                                energy,
                                energy.value_in("kJ/mol").unwrap_or(f64::NAN)
                            );
                        }
                    }
                    Err(e) => println!("\n{}: {}", query, e),
                }
            }
        }
        2 => {
            // build a library by hand, save it in the record format and read it back
            let text = r#"
name = "My metals"
entry(
    index = 1,
    label = "Cu111",
    bindingEnergies = {'C': (-4.96, 'eV/molecule'), 'O': (-4.20, 'eV/molecule')},
    surfaceSiteDensity = (2.943E-09, 'mol/cm^2'),
    facet = "111",
    metal = "Cu",
    shortDesc = u"fcc",
    longDesc = u"""illustrative values""",
)
"#;
            let mut lib = MetalLibrary::new("surface");
            if let Err(e) = lib.load_from_str(text) {
                error!("{}", e);
                return;
            }
            let path = std::env::temp_dir().join("kisurf_example").join("metal.py");
            match lib.save(&path) {
                Ok(()) => println!("saved to {}", path.display()),
                Err(e) => error!("{}", e),
            }
            let mut back = MetalLibrary::new("surface");
            match back.load(&path) {
                Ok(()) => println!("round trip equal: {}", back.entries == lib.entries),
                Err(e) => error!("{}", e),
            }
            match lib.to_json() {
                Ok(json) => println!("{}", json),
                Err(e) => error!("{}", e),
            }
        }
        _ => println!("No example with number {}", surftask),
    }
}
