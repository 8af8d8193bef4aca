//! Dashboard template: report snapshots to a complete HTML document.
//!
//! Pure string building, no I/O. The page carries a summary table and one
//! dygraph container per chart, with the serialized report data embedded so
//! the client can draw (and redraw) charts without another round trip, and
//! an auto-refresh timer driven by the configured period.

use crate::report::Report;

/// Default dygraph script location baked into rendered pages.
pub const DEFAULT_DYGRAPH_SOURCE: &str = "https://dygraphs.com/1.0.1/dygraph-combined.js";

/// Input to the template function.
pub struct TemplateData<'a> {
    pub dygraph_script_source: &'a str,
    pub refresh_period_ms: u64,
    pub reports: &'a [Report],
}

/// Render the complete dashboard document. Valid (if empty) with zero
/// reports.
pub fn dashboard(data: &TemplateData<'_>) -> String {
    let report_json =
        serde_json::to_string(data.reports).unwrap_or_else(|_| "[]".to_string());

    let mut html = String::new();
    html.push_str(&format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Load Test Results</title>
    <script src="{}"></script>
    <style>
        body {{ font-family: 'Segoe UI', Tahoma, Geneva, Verdana, sans-serif; background: #f8f9fa; color: #333; margin: 0; }}
        .container {{ max-width: 1200px; margin: 0 auto; padding: 20px; }}
        h1 {{ color: #2c3e50; }}
        h2 {{ color: #34495e; border-bottom: 2px solid #3498db; padding-bottom: 8px; }}
        table {{ width: 100%; border-collapse: collapse; margin: 16px 0; background: white; }}
        th, td {{ padding: 8px 12px; text-align: left; border-bottom: 1px solid #e2e8f0; }}
        th {{ background: #f7fafc; color: #4a5568; }}
        .chart {{ background: white; padding: 16px; margin: 16px 0; box-shadow: 0 2px 6px rgba(0,0,0,0.1); }}
        .chart-title {{ color: #7f8c8d; margin-bottom: 8px; }}
        .empty {{ color: #718096; padding: 40px 0; text-align: center; }}
    </style>
</head>
<body>
    <div class="container">
        <h1>Load Test Results</h1>
"#,
        escape(data.dygraph_script_source)
    ));

    if data.reports.is_empty() {
        html.push_str("        <div class=\"empty\">No reports yet.</div>\n");
    }

    for report in data.reports {
        html.push_str(&format!("        <h2>{}</h2>\n", escape(report.name())));

        if !report.summary().is_empty() {
            html.push_str("        <table>\n");
            html.push_str("            <tr><th>Statistic</th><th>Value</th></tr>\n");
            for (key, value) in report.summary() {
                html.push_str(&format!(
                    "            <tr><td>{}</td><td>{}</td></tr>\n",
                    escape(key),
                    value
                ));
            }
            html.push_str("        </table>\n");
        }

        for chart in report.charts().values() {
            html.push_str(&format!(
                "        <div class=\"chart\"><div class=\"chart-title\">{}</div><div id=\"chart_{}\"></div></div>\n",
                escape(chart.name()),
                chart.id()
            ));
        }
    }

    html.push_str(&format!(
        r#"    </div>
    <script id="report-data" type="application/json">{}</script>
    <script>
        var reports = JSON.parse(document.getElementById('report-data').textContent);
        reports.forEach(function(report) {{
            Object.keys(report.charts).forEach(function(name) {{
                var chart = report.charts[name];
                var rows = chart.rows.map(function(row) {{
                    var full = row.slice();
                    while (full.length < chart.columns.length) {{ full.push(null); }}
                    return full;
                }});
                new Dygraph(document.getElementById('chart_' + chart.id), rows, {{
                    labels: chart.columns,
                    xlabel: 'minutes',
                    connectSeparatedPoints: true
                }});
            }});
        }});
        setTimeout(function() {{ window.location.reload(); }}, {});
    </script>
</body>
</html>"#,
        report_json, data.refresh_period_ms
    ));

    html
}

fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
