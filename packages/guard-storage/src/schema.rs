pub fn render_schema() -> String {
	expand_includes(include_str!("../../../sql/init.sql"))
}

/// The rendered schema as individual statements, in file order.
pub fn statements() -> Vec<String> {
	render_schema()
		.split(';')
		.map(str::trim)
		.filter(|statement| !statement.is_empty())
		.map(str::to_string)
		.collect()
}

fn expand_includes(sql: &str) -> String {
	let mut out = String::new();

	for line in sql.lines() {
		let trimmed = line.trim();

		if let Some(path) = trimmed.strip_prefix("\\ir ") {
			match path.trim() {
				"00_extensions.sql" => out.push_str(include_str!("../../../sql/00_extensions.sql")),
				"tables/001_guard_detections.sql" =>
					out.push_str(include_str!("../../../sql/tables/001_guard_detections.sql")),
				"tables/002_guard_frame_metadata.sql" =>
					out.push_str(include_str!("../../../sql/tables/002_guard_frame_metadata.sql")),
				_ => out.push_str(line),
			}
		} else {
			out.push_str(line);
		}

		out.push('\n');
	}

	out
}
