/////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
// TESTS
//////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////////
#[cfg(test)]
mod tests {
    use crate::Surface::DatabaseError;
    use crate::Surface::metal_database::MetalDatabase;
    use crate::Surface::metal_library::{Entry, MetalLibrary};
    use crate::Surface::quantity::{RawQuantity, SurfaceConcentration};
    use approx::assert_relative_eq;
    use std::collections::BTreeMap;
    use std::path::PathBuf;
    use tempfile::tempdir;

    fn database_path() -> PathBuf {
        PathBuf::from(env!("CARGO_MANIFEST_DIR"))
            .join("database")
            .join("surface")
    }

    fn database() -> MetalDatabase {
        let mut db = MetalDatabase::new();
        db.load(database_path()).unwrap();
        db
    }

    #[test]
    fn test_load_metal_library() {
        let db = database();
        let test_entry = Entry {
            index: 1,
            label: "Pt111".to_string(),
            binding_energies: BTreeMap::from([
                ("H".to_string(), RawQuantity::new(-2.75367887E+00, "eV/molecule")),
                ("C".to_string(), RawQuantity::new(-7.02515507E+00, "eV/molecule")),
                ("N".to_string(), RawQuantity::new(-4.63224568E+00, "eV/molecule")),
                ("O".to_string(), RawQuantity::new(-3.81153179E+00, "eV/molecule")),
            ]),
            surface_site_density: Some(RawQuantity::new(2.483E-09, "mol/cm^2")),
            facet: "111".to_string(),
            metal: "Pt".to_string(),
            short_desc: "fcc".to_string(),
            long_desc: "Calculated by Katrin Blondal and Bjarne Kreitz at Brown University"
                .to_string(),
        };
        assert_eq!(
            db.get_binding_energies(&test_entry.label).unwrap(),
            &test_entry.binding_energies
        );
        assert_eq!(
            db.get_surface_site_density(&test_entry.label).unwrap(),
            test_entry.surface_site_density.as_ref()
        );
        assert_eq!(db.surface().get_entry("Pt111").unwrap(), &test_entry);
        let density =
            SurfaceConcentration::try_from(db.get_surface_site_density("Pt111").unwrap().unwrap())
                .unwrap();
        assert_relative_eq!(density.value_si(), 2.483e-5, epsilon = 1e-15);
    }

    #[test]
    fn test_load_from_label() {
        let db = database();
        assert!(db.get_binding_energies("Pt111").is_ok());
        assert!(matches!(
            db.get_binding_energies("Pt000"),
            Err(DatabaseError::NotFound(_))
        ));
        assert!(matches!(
            db.get_surface_site_density("Pt000"),
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_load_all_entries_on_one_metal() {
        let db = database();
        assert_eq!(db.get_all_entries_on_metal("Pt").unwrap().len(), 2);
        assert_eq!(db.get_all_entries_on_metal("Ni").unwrap().len(), 2);
        assert_eq!(
            db.get_all_entries_on_metal("Co").unwrap(),
            vec!["Co0001".to_string(), "Co111".to_string()]
        );
        assert!(matches!(
            db.get_all_entries_on_metal("Pt111"),
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_find_binding_energies_exact_label() {
        let db = database();
        let energies = db.find_binding_energies("Ni211").unwrap();
        assert_eq!(energies.len(), 4);
        assert_relative_eq!(
            energies["C"].value_in("eV/molecule").unwrap(),
            -7.10,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_find_binding_energies_falls_back_to_metal() {
        let db = database();
        // no facet given: first entry on the metal
        let pt = db.find_binding_energies("Pt").unwrap();
        assert_relative_eq!(
            pt["H"].value_in("eV/molecule").unwrap(),
            -2.75367887,
            epsilon = 1e-12
        );
        // facet not in the database: same fallback on the bare metal name
        let pt_211 = db.find_binding_energies("Pt211").unwrap();
        assert_eq!(pt_211, pt);
        let ni = db.find_binding_energies(" Ni ").unwrap();
        assert_relative_eq!(
            ni["O"].value_in("eV/molecule").unwrap(),
            -5.20,
            epsilon = 1e-12
        );
    }

    #[test]
    fn test_find_binding_energies_errors() {
        let db = database();
        assert!(matches!(
            db.find_binding_energies(""),
            Err(DatabaseError::InvalidQuery(_))
        ));
        assert!(matches!(
            db.find_binding_energies("Au"),
            Err(DatabaseError::NotFound(_))
        ));
        assert!(matches!(
            db.find_binding_energies("Au111"),
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_surface_library_always_present() {
        let mut db = MetalDatabase::default();
        assert!(db.surface().is_empty());
        assert!(matches!(
            db.get_binding_energies("Pt111"),
            Err(DatabaseError::NotFound(_))
        ));
        db.load(database_path()).unwrap();
        assert_eq!(db.surface().label, "surface");
        assert!(!db.surface().is_empty());
    }

    #[test]
    fn test_find_binding_energies_facet_without_metal() {
        let mut db = MetalDatabase::new();
        // an entry with no metal field must not be reachable through a bare facet
        db.surface_mut()
            .load_from_str("entry(index=1, label='X', bindingEnergies={'C': (-7.0, 'eV/molecule')})")
            .unwrap();
        assert!(matches!(
            db.find_binding_energies("111"),
            Err(DatabaseError::InvalidQuery(_))
        ));
        assert!(matches!(
            database().find_binding_energies(" 211 "),
            Err(DatabaseError::InvalidQuery(_))
        ));
    }

    #[test]
    fn test_find_binding_energies_rejects_unknown_units() {
        let mut db = MetalDatabase::new();
        db.surface_mut()
            .load_from_str("entry(index=1, label='Rh111', metal='Rh', bindingEnergies={'C': (-7.0, 'parsec')})")
            .unwrap();
        assert!(matches!(
            db.find_binding_energies("Rh111"),
            Err(DatabaseError::UnsupportedUnit(_))
        ));
    }

    #[test]
    fn test_save_and_reload_round_trip() {
        let db = database();
        let dir = tempdir().unwrap();
        let target = dir.path().join("nested").join("surface");
        db.save(&target).unwrap();
        assert!(target.join("libraries").join("metal.py").exists());

        let mut reloaded = MetalDatabase::new();
        reloaded.load(&target).unwrap();
        assert_eq!(reloaded.surface().entries, db.surface().entries);
        assert_eq!(reloaded.surface().name, db.surface().name);
        assert_eq!(reloaded.surface().short_desc, db.surface().short_desc);
        assert_eq!(reloaded.surface().long_desc, db.surface().long_desc);

        // a second pass writes the same text
        let first = std::fs::read_to_string(target.join("libraries").join("metal.py")).unwrap();
        let again = dir.path().join("again");
        reloaded.save(&again).unwrap();
        let second = std::fs::read_to_string(again.join("libraries").join("metal.py")).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn test_library_save_creates_directories() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("a").join("b").join("lib.py");
        let mut lib = MetalLibrary::new("surface");
        lib.load_from_str("entry(index = 7, label = 'Cu111', metal = 'Cu', facet = '111')")
            .unwrap();
        lib.save(&path).unwrap();
        let mut back = MetalLibrary::new("surface");
        back.load(&path).unwrap();
        assert_eq!(back.entries, lib.entries);
    }

    #[test]
    fn test_missing_database() {
        let dir = tempdir().unwrap();
        let mut db = MetalDatabase::new();
        assert!(matches!(
            db.load(dir.path().join("nowhere")),
            Err(DatabaseError::NotFound(_))
        ));
    }

    #[test]
    fn test_malformed_library() {
        let dir = tempdir().unwrap();
        let libraries = dir.path().join("libraries");
        std::fs::create_dir_all(&libraries).unwrap();
        std::fs::write(libraries.join("metal.py"), "entry(\n    index = 1,\n    label = \"Pt111\"\n    metal = \"Pt\",\n)\n").unwrap();
        let mut db = MetalDatabase::new();
        match db.load(dir.path()) {
            Err(DatabaseError::Parse { line, .. }) => assert_eq!(line, 4),
            other => panic!("expected a parse error, got {:?}", other),
        }
    }

    #[test]
    fn test_old_format_not_supported() {
        let mut db = MetalDatabase::new();
        assert!(matches!(
            db.load_old("anything"),
            Err(DatabaseError::NotSupported(_))
        ));
        assert!(matches!(
            db.save_old("anything"),
            Err(DatabaseError::NotSupported(_))
        ));
    }
}
