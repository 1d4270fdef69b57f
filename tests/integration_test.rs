//! End-to-end tests against an in-memory SDE

use eve_industry::materials::activity_materials;
use eve_industry::*;
use rust_decimal::Decimal;

fn sample_sde() -> Sde {
    let sde = Sde::open_in_memory().unwrap();
    for (id, name) in [
        (34, "Tritanium"),
        (35, "Pyerite"),
        (36, "Mexallon"),
        (38, "Nocxium"),
        (587, "Rifter"),
        (691, "Rifter Blueprint"),
        (2046, "Damage Control I"),
        (2047, "Damage Control I Blueprint"),
        (2048, "Damage Control II"),
        (2049, "Damage Control II Blueprint"),
        (11371, "Wolf"),
        (11372, "Wolf Blueprint"),
        (30000, "Broken Widget"),
        (30001, "Broken Widget Blueprint"),
    ] {
        sde.upsert_type(id, name, true).unwrap();
    }

    sde.insert_activity(691, Activity::Manufacturing, 6000).unwrap();
    sde.insert_product(691, Activity::Manufacturing, 587, 1).unwrap();
    sde.insert_material(691, Activity::Manufacturing, 34, 32000).unwrap();
    sde.insert_material(691, Activity::Manufacturing, 35, 6000).unwrap();
    sde.insert_material(691, Activity::Manufacturing, 36, 2500).unwrap();

    for (bp, product) in [(2047, 2046), (2049, 2048)] {
        sde.insert_activity(bp, Activity::Manufacturing, 600).unwrap();
        sde.insert_product(bp, Activity::Manufacturing, product, 1).unwrap();
    }
    sde.insert_material(2047, Activity::Manufacturing, 34, 800).unwrap();
    sde.insert_material(2049, Activity::Manufacturing, 2046, 1).unwrap();
    sde.insert_material(2049, Activity::Manufacturing, 38, 12).unwrap();

    // Wolf lists Nocxium on two lines
    sde.insert_activity(11372, Activity::Manufacturing, 60000).unwrap();
    sde.insert_product(11372, Activity::Manufacturing, 11371, 1).unwrap();
    sde.insert_material(11372, Activity::Manufacturing, 587, 1).unwrap();
    sde.insert_material(11372, Activity::Manufacturing, 38, 100).unwrap();
    sde.insert_material(11372, Activity::Manufacturing, 38, 40).unwrap();

    // Manufacturing activity present but with no materials
    sde.insert_activity(30001, Activity::Manufacturing, 60).unwrap();
    sde.insert_product(30001, Activity::Manufacturing, 30000, 1).unwrap();

    sde
}

#[test]
fn test_materials_with_structure_bonus() {
    let sde = sample_sde();
    let config = PlannerConfig::new("1".parse().unwrap()).unwrap();
    let planner = Planner::new(&sde, config);

    let plan = planner.resolve_materials("Rifter", 10, 2).unwrap().found().unwrap();

    // base * runs * 0.9 * 0.99
    assert_eq!(plan.requirements[&34], 57_024);
    assert_eq!(plan.requirements[&35], 10_692);
    assert_eq!(plan.requirements[&36], 4_455);
    assert_eq!(plan.runs, 2);
    assert_eq!(plan.structure_bonus, Decimal::ONE);
}

#[test]
fn test_small_quantities_never_drop_below_runs() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());
    let plan = planner.resolve_materials("Damage Control II", 10, 5).unwrap().found().unwrap();

    assert_eq!(plan.requirements[&2046], 5);
    // 12 * 5 * 0.9 = 54
    assert_eq!(plan.requirements[&38], 54);
}

#[test]
fn test_duplicate_material_lines_are_summed() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());
    let plan = planner.resolve_materials("Wolf", 0, 1).unwrap().found().unwrap();

    assert_eq!(plan.requirements[&38], 140);
    assert_eq!(plan.requirements[&587], 1);
    assert_eq!(plan.requirements.len(), 2);
}

#[test]
fn test_efficiency_comparison_is_monotonic() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());
    let comparison = planner.compare_efficiency("Rifter", 3).unwrap().found().unwrap();

    assert_eq!(comparison.levels.len(), 11);
    let levels: Vec<u8> = comparison.levels.keys().copied().collect();
    assert_eq!(levels, (0..=10).collect::<Vec<u8>>());

    for material in [34, 35, 36] {
        let column: Vec<i64> = comparison.levels.values().map(|r| r[&material]).collect();
        assert!(column.windows(2).all(|w| w[0] >= w[1]), "{material}: {column:?}");
    }
    assert_eq!(comparison.levels[&0][&34], 96_000);
    assert_eq!(comparison.levels[&10][&34], 86_400);
}

#[test]
fn test_shortage_against_snapshots() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());
    let plan = planner.resolve_materials("Rifter", 10, 1).unwrap().found().unwrap();

    let empty = InventorySnapshot::default();
    assert_eq!(compute_shortage(&plan.requirements, &empty), plan.requirements);

    let everything = InventorySnapshot::from_totals(plan.requirements.clone());
    assert!(compute_shortage(&plan.requirements, &everything).is_empty());

    let list = planner.shopping_list(&plan.requirements, &everything).unwrap();
    assert!(list.ready_to_build());
    assert_eq!(list.missing_count(), 0);
}

#[test]
fn test_shopping_list_from_pasted_inventory() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());
    let plan = planner.resolve_materials("Rifter", 10, 1).unwrap().found().unwrap();

    let pasted = "Tritanium\t30,000\tMineral\nPyerite\t100\tMineral\nUnobtainium\t5\n";
    let load = InventorySnapshot::parse(pasted, planner.catalog()).unwrap();
    assert_eq!(load.unresolved, vec!["Unobtainium".to_string()]);

    let list = planner.shopping_list(&plan.requirements, &load.snapshot).unwrap();
    assert_eq!(list.shortage.get(&34), None);
    assert_eq!(list.shortage[&35], 5_300);
    assert_eq!(list.shortage[&36], 2_250);
    assert_eq!(list.missing_count(), 2);
    assert!(!list.ready_to_build());
}

#[test]
fn test_shopping_list_from_asset_json() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());
    let plan = planner.resolve_materials("Rifter", 10, 1).unwrap().found().unwrap();

    let assets = r#"[
        {"type_id": 34, "quantity": 20000, "location_id": 60003760},
        {"type_id": 34, "quantity": 8800, "location_id": 60008494},
        {"type_id": 35, "quantity": 5400},
        {"type_id": 36, "quantity": 2250}
    ]"#;
    let load = InventorySnapshot::parse(assets, planner.catalog()).unwrap();
    assert_eq!(load.snapshot.quantity(34), 28_800);

    let list = planner.shopping_list(&plan.requirements, &load.snapshot).unwrap();
    assert!(list.ready_to_build());
}

#[test]
fn test_shopping_list_from_totals_json() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());
    let plan = planner.resolve_materials("Rifter", 10, 1).unwrap().found().unwrap();

    let totals = "\n  {\"34\": 28800, \"35\": -40, \"36\": 1000}\n";
    let load = InventorySnapshot::parse(totals, planner.catalog()).unwrap();
    assert!(load.unresolved.is_empty());

    let list = planner.shopping_list(&plan.requirements, &load.snapshot).unwrap();
    assert_eq!(list.shortage.get(&34), None);
    assert_eq!(list.shortage[&35], 5_400);
    assert_eq!(list.shortage[&36], 1_250);
}

#[test]
fn test_lookup_errors_and_ambiguity() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());

    match planner.resolve_materials("damage control", 10, 1).unwrap() {
        Lookup::Ambiguous(candidates) => assert_eq!(candidates.len(), 2),
        Lookup::Found(plan) => panic!("expected ambiguity, got {}", plan.blueprint.product_name),
    }

    let err = planner.resolve_materials("Avatar", 10, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);

    let err = planner.resolve_materials("Tritanium", 10, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::NotFound);
    assert!(matches!(err, IndustryError::NotProducible { type_id: 34, .. }));

    let err = planner.resolve_materials("Rifter", -1, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::Validation);
}

#[test]
fn test_data_integrity_errors() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());

    let err = planner.resolve_materials("Broken Widget", 10, 1).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);

    let err = activity_materials(&sde, 691, Activity::Invention).unwrap_err();
    assert_eq!(err.kind(), ErrorKind::DataIntegrity);
    assert!(err.to_string().contains("Invention"));
}

#[test]
fn test_combined_requests() {
    let sde = sample_sde();
    let planner = Planner::new(&sde, PlannerConfig::default());

    let rifters = ManufacturingRequest {
        blueprint_type_id: 691,
        material_efficiency: 10,
        runs: 1,
        structure_bonus: Decimal::ZERO,
    };
    let damage_controls = ManufacturingRequest {
        blueprint_type_id: 2047,
        material_efficiency: 0,
        runs: 2,
        structure_bonus: Decimal::ZERO,
    };
    let combined = planner.requirements(&[rifters, damage_controls]).unwrap();

    assert_eq!(combined[&34], 28_800 + 1_600);
    assert_eq!(combined[&35], 5_400);
}

#[test]
fn test_dataset_verification() {
    let sde = sample_sde();
    assert!(sde.verify().is_ok());

    let empty = Sde::open_in_memory().unwrap();
    assert_eq!(empty.verify().unwrap_err().kind(), ErrorKind::DataIntegrity);

    let missing = Sde::open(std::path::Path::new("/nonexistent/sqlite-latest.sqlite")).unwrap_err();
    assert_eq!(missing.kind(), ErrorKind::Dataset);
}
