//! Plain-text rendering of calculation results

use std::fmt;

use rust_decimal::Decimal;

use crate::materials::BlueprintDetail;
use crate::models::Item;
use crate::planner::{EfficiencyComparison, MaterialPlan};
use crate::shortage::ShoppingList;

/// Format seconds as `Xh Ym`
pub fn format_duration(seconds: i64) -> String {
    let hours = seconds / 3600;
    let minutes = (seconds % 3600) / 60;
    format!("{hours}h {minutes}m")
}

/// Group digits in threes: 1234567 -> "1,234,567"
pub fn thousands(n: i64) -> String {
    let digits = n.unsigned_abs().to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 + 1);
    if n < 0 {
        out.push('-');
    }
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}

fn banner(f: &mut fmt::Formatter<'_>, title: &str, width: usize) -> fmt::Result {
    writeln!(f, "{}", "=".repeat(width))?;
    writeln!(f, "{title}")?;
    writeln!(f, "{}", "=".repeat(width))
}

fn structure_line(f: &mut fmt::Formatter<'_>, bonus: Decimal) -> fmt::Result {
    if bonus > Decimal::ZERO {
        writeln!(f, "  Structure: -{bonus}% materials")?;
    }
    Ok(())
}

/// Search hits as an id/name table
pub struct SearchResults<'a> {
    pub term: &'a str,
    pub items: &'a [Item],
}

impl fmt::Display for SearchResults<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Search results for '{}':", self.term)?;
        for item in self.items {
            writeln!(f, "  {:>8}  {}", item.type_id, item.name)?;
        }
        Ok(())
    }
}

impl fmt::Display for MaterialPlan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "MATERIAL REQUIREMENTS", 70)?;
        writeln!(f)?;
        writeln!(f, "  Blueprint: {}", self.blueprint.blueprint_name)?;
        writeln!(f, "  Product:   {}", self.blueprint.product_name)?;
        writeln!(f, "  ME Level:  {}", self.material_efficiency)?;
        writeln!(f, "  Runs:      {}", self.runs)?;
        structure_line(f, self.structure_bonus)?;
        writeln!(f)?;

        let total_header = format!("Total(ME{})", self.material_efficiency);
        writeln!(
            f,
            "  {:<30} {:>10} {:>12} {:>10}",
            "Material", "Per Run", total_header, "Saved"
        )?;
        writeln!(f, "  {} {} {} {}", "-".repeat(30), "-".repeat(10), "-".repeat(12), "-".repeat(10))?;
        for line in &self.lines {
            writeln!(
                f,
                "  {:<30} {:>10} {:>12} {:>10}",
                line.name,
                thousands(line.base_quantity),
                thousands(line.adjusted_quantity),
                thousands(line.saved)
            )?;
        }

        if let Some(seconds) = self.base_time_s {
            writeln!(f)?;
            writeln!(f, "  Base manufacturing time (per run): {}", format_duration(seconds))?;
        }
        Ok(())
    }
}

impl fmt::Display for EfficiencyComparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "ME COMPARISON TABLE", 70)?;
        writeln!(f)?;
        let plural = if self.runs == 1 { "" } else { "s" };
        writeln!(
            f,
            "  Blueprint: {} ({} run{plural})",
            self.blueprint.blueprint_name, self.runs
        )?;
        structure_line(f, self.structure_bonus)?;
        writeln!(f)?;

        write!(f, "  {:<28}", "Material")?;
        for me in self.levels.keys() {
            write!(f, " {:>9}", format!("ME{me}"))?;
        }
        writeln!(f)?;
        write!(f, "  {}", "-".repeat(28))?;
        for _ in self.levels.keys() {
            write!(f, " {}", "-".repeat(9))?;
        }
        writeln!(f)?;

        // A material listed on several lines is shown once with its total
        let mut seen = Vec::new();
        for material in &self.materials {
            if seen.contains(&material.type_id) {
                continue;
            }
            seen.push(material.type_id);

            write!(f, "  {:<28}", material.name)?;
            for requirements in self.levels.values() {
                let quantity = requirements.get(&material.type_id).copied().unwrap_or(0);
                write!(f, " {:>9}", thousands(quantity))?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}

impl fmt::Display for BlueprintDetail {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        banner(f, "BLUEPRINT DETAIL", 70)?;
        writeln!(f)?;
        writeln!(f, "  Blueprint: {}", self.blueprint.blueprint_name)?;
        writeln!(
            f,
            "  Product:   {} (type_id: {})",
            self.blueprint.product_name, self.blueprint.product_type_id
        )?;

        for activity in &self.activities {
            writeln!(f)?;
            writeln!(f, "  --- {} ---", activity.activity)?;
            if let Some(seconds) = activity.base_time_s {
                writeln!(f, "  Base time: {}", format_duration(seconds))?;
            }
            for line in &activity.materials {
                writeln!(f, "    {:>10}x  {}", thousands(line.quantity), line.name)?;
            }
        }

        if !self.invention_outcomes.is_empty() {
            writeln!(f)?;
            writeln!(f, "  --- Invention Outcomes ---")?;
            for product in &self.invention_outcomes {
                writeln!(f, "    -> {} x{}", product.name, product.quantity)?;
            }
        }
        Ok(())
    }
}

impl fmt::Display for ShoppingList {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "  {:<30} {:>10} {:>10} {:>10} {:>6}",
            "Material", "Need", "Have", "Buy", ""
        )?;
        writeln!(
            f,
            "  {} {} {} {} {}",
            "-".repeat(30),
            "-".repeat(10),
            "-".repeat(10),
            "-".repeat(10),
            "-".repeat(6)
        )?;
        for line in &self.lines {
            let status = if line.is_covered() { "OK" } else { "NEED" };
            writeln!(
                f,
                "  {:<30} {:>10} {:>10} {:>10} {:>6}",
                line.name,
                thousands(line.needed),
                thousands(line.have),
                thousands(line.buy),
                status
            )?;
        }
        writeln!(f)?;

        if self.ready_to_build() {
            writeln!(f, "  All materials on hand. Ready to build!")
        } else {
            writeln!(
                f,
                "  Missing {} material(s). See 'Buy' column above.",
                self.missing_count()
            )
        }
    }
}
