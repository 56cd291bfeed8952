use crate::extractor::{EditableParameter, NodeNames};

pub const SLIDER_WIDTH: usize = 24;

pub fn render_nodes(nodes: &NodeNames, selected: Option<&str>) -> String {
    match nodes {
        NodeNames::Error(msg) => format!("  {msg}\n"),
        NodeNames::Nodes(list) if list.is_empty() => "  (no nodes yet; try `fetch`)\n".to_string(),
        NodeNames::Nodes(list) => list
            .iter()
            .map(|n| {
                let mark = if Some(n.as_str()) == selected { '*' } else { ' ' };
                format!(" {mark} {n}\n")
            })
            .collect(),
    }
}

pub fn render_rows(node: &str, rows: &[EditableParameter]) -> String {
    if rows.is_empty() {
        return format!("  [{node}] no editable parameters\n");
    }
    let mut out = format!("  [{node}]\n");
    for (i, row) in rows.iter().enumerate() {
        out.push_str(&format!(
            "  {:>3} {:<24} {:>10.3} {} [{} .. {} step {}]\n",
            i,
            row.leaf_name,
            row.value,
            slider(row.value, row.min, row.max, SLIDER_WIDTH),
            row.min,
            row.max,
            row.step
        ));
    }
    out
}

fn slider(value: f64, min: f64, max: f64, width: usize) -> String {
    let width = width.max(2);
    let span = max - min;
    let frac = if span > 0.0 && span.is_finite() && value.is_finite() {
        ((value - min) / span).clamp(0.0, 1.0)
    } else {
        0.0
    };
    let pos = (frac * (width - 1) as f64).round() as usize;
    let track: String = (0..width)
        .map(|i| match i.cmp(&pos) {
            std::cmp::Ordering::Less => '=',
            std::cmp::Ordering::Equal => '|',
            std::cmp::Ordering::Greater => '-',
        })
        .collect();
    format!("[{track}]")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slider_marks_position() {
        assert_eq!(slider(0.0, 0.0, 10.0, 5), "[|----]");
        assert_eq!(slider(10.0, 0.0, 10.0, 5), "[====|]");
        assert_eq!(slider(5.0, 0.0, 10.0, 5), "[==|--]");
    }

    #[test]
    fn slider_clamps_and_tolerates_empty_range() {
        assert_eq!(slider(50.0, 0.0, 10.0, 3), "[==|]");
        assert_eq!(slider(1.0, 1.0, 1.0, 3), "[|--]");
        assert_eq!(slider(f64::NAN, 0.0, 1.0, 3), "[|--]");
    }

    #[test]
    fn nodes_listing_marks_selection() {
        let nodes = NodeNames::Nodes(vec!["camA".into(), "camB".into()]);
        assert_eq!(render_nodes(&nodes, Some("camB")), "   camA\n * camB\n");
    }
}
