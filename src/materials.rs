//! Blueprint material tables

use serde::Serialize;

use crate::db::Sde;
use crate::error::{IndustryError, Result};
use crate::models::{Activity, ActivityMaterials, ActivityProduct, BlueprintMatch, TypeId};

/// Material lines and base duration for one activity of a blueprint
///
/// Fails when the blueprint has no data at all for the activity, or when an
/// activity that has to consume materials lists none.
pub fn activity_materials(
    sde: &Sde,
    blueprint_id: TypeId,
    activity: Activity,
) -> Result<ActivityMaterials> {
    let base_time_s = sde.activity_time(blueprint_id, activity)?;
    let materials = sde.activity_materials(blueprint_id, activity)?;

    if materials.is_empty() {
        match base_time_s {
            None => {
                return Err(IndustryError::MissingActivity {
                    blueprint_id,
                    activity,
                });
            }
            Some(_) if activity.consumes_materials() => {
                return Err(IndustryError::EmptyMaterials {
                    blueprint_id,
                    activity,
                });
            }
            Some(_) => {}
        }
    }

    if let Some(line) = materials.iter().find(|line| line.quantity < 0) {
        return Err(IndustryError::NegativeQuantity {
            blueprint_id,
            material_id: line.type_id,
            quantity: line.quantity,
        });
    }

    Ok(ActivityMaterials {
        blueprint_type_id: blueprint_id,
        activity,
        base_time_s,
        materials,
    })
}

/// Everything the dataset knows about a blueprint
#[derive(Debug, Clone, Serialize)]
pub struct BlueprintDetail {
    pub blueprint: BlueprintMatch,
    pub activities: Vec<ActivityMaterials>,
    pub invention_outcomes: Vec<ActivityProduct>,
}

/// Every activity with a duration or materials, in display order
pub fn blueprint_detail(sde: &Sde, blueprint: &BlueprintMatch) -> Result<BlueprintDetail> {
    let id = blueprint.blueprint_type_id;
    let mut activities = Vec::new();
    for activity in Activity::ALL {
        let base_time_s = sde.activity_time(id, activity)?;
        let materials = sde.activity_materials(id, activity)?;
        if base_time_s.is_some() || !materials.is_empty() {
            activities.push(ActivityMaterials {
                blueprint_type_id: id,
                activity,
                base_time_s,
                materials,
            });
        }
    }

    Ok(BlueprintDetail {
        blueprint: blueprint.clone(),
        activities,
        invention_outcomes: sde.activity_products(id, Activity::Invention)?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fixture() -> Sde {
        let sde = Sde::open_in_memory().unwrap();
        sde.upsert_type(34, "Tritanium", true).unwrap();
        sde.upsert_type(20410, "Datacore - Mechanical Engineering", true).unwrap();
        sde.upsert_type(587, "Rifter", true).unwrap();
        sde.upsert_type(691, "Rifter Blueprint", true).unwrap();
        sde.upsert_type(11371, "Wolf Blueprint", true).unwrap();

        sde.insert_activity(691, Activity::Manufacturing, 6000).unwrap();
        sde.insert_product(691, Activity::Manufacturing, 587, 1).unwrap();
        sde.insert_material(691, Activity::Manufacturing, 34, 32000).unwrap();
        sde.insert_activity(691, Activity::Copying, 4800).unwrap();
        sde.insert_activity(691, Activity::Invention, 63900).unwrap();
        sde.insert_material(691, Activity::Invention, 20410, 2).unwrap();
        sde.insert_product(691, Activity::Invention, 11371, 1).unwrap();
        sde
    }

    #[test]
    fn test_manufacturing_materials() {
        let sde = fixture();
        let table = activity_materials(&sde, 691, Activity::Manufacturing).unwrap();
        assert_eq!(table.base_time_s, Some(6000));
        assert_eq!(table.materials.len(), 1);
        assert_eq!(table.materials[0].quantity, 32000);
    }

    #[test]
    fn test_missing_activity() {
        let sde = fixture();
        assert!(matches!(
            activity_materials(&sde, 691, Activity::Reactions),
            Err(IndustryError::MissingActivity {
                blueprint_id: 691,
                activity: Activity::Reactions
            })
        ));
    }

    #[test]
    fn test_activity_without_materials() {
        let sde = fixture();
        sde.insert_activity(691, Activity::Reactions, 100).unwrap();
        assert!(matches!(
            activity_materials(&sde, 691, Activity::Reactions),
            Err(IndustryError::EmptyMaterials { .. })
        ));
    }

    #[test]
    fn test_copying_needs_no_materials() {
        let sde = fixture();
        let table = activity_materials(&sde, 691, Activity::Copying).unwrap();
        assert_eq!(table.base_time_s, Some(4800));
        assert!(table.materials.is_empty());
    }

    #[test]
    fn test_negative_quantity_is_rejected() {
        let sde = fixture();
        sde.insert_material(691, Activity::Manufacturing, 35, -5).unwrap();
        assert!(matches!(
            activity_materials(&sde, 691, Activity::Manufacturing),
            Err(IndustryError::NegativeQuantity { material_id: 35, .. })
        ));
    }

    #[test]
    fn test_blueprint_detail() {
        let sde = fixture();
        let blueprint = sde.blueprint(691).unwrap().unwrap();
        let detail = blueprint_detail(&sde, &blueprint).unwrap();

        let activities: Vec<_> = detail.activities.iter().map(|a| a.activity).collect();
        assert_eq!(
            activities,
            vec![Activity::Manufacturing, Activity::Copying, Activity::Invention]
        );
        assert!(detail.activities[1].materials.is_empty());
        assert_eq!(detail.invention_outcomes.len(), 1);
        assert_eq!(detail.invention_outcomes[0].name, "Wolf Blueprint");
    }
}
