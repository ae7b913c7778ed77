//! Export Templates
//!
//! Text of the files in an exported PyScript app.

/// Runtime hosted on pyscript.com
pub const HOSTED_INVENT_SRC: &str = "https://mchilvers.pyscriptapps.com/invent/latest/invent";

/// Runtime from a checkout, relative to the exported app
pub const LOCAL_INVENT_SRC: &str = "../../src/invent";

/// Runtime modules fetched into the browser's virtual filesystem
pub const INVENT_FILES: &[&str] = &[
    "__init__.py",
    "__about__.py",
    "channels.py",
    "datastore.py",
    "i18n.py",
    "media.py",
    "utils.py",
    "ui/__init__.py",
    "ui/app.py",
    "ui/core.py",
    "ui/export.py",
    "ui/page.py",
    "ui/utils.py",
    "ui/widgets/__init__.py",
    "ui/widgets/button.py",
    "ui/widgets/code.py",
    "ui/widgets/image.py",
    "ui/widgets/textbox.py",
    "ui/widgets/textinput.py",
];

pub const IMPORTS: &str = "import invent\nfrom invent.ui import *\n";

const BANNER_WIDTH: usize = 88;

pub fn index_html(pyscript_version: &str, stylesheet: &str) -> String {
    format!(
        r#"<!DOCTYPE html>
<html lang="en">
<head>
    <title>Invent</title>

    <!-- Recommended meta tags -->
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width,initial-scale=1.0">

    <!-- PyScript -->
    <link rel="stylesheet" href="https://pyscript.net/releases/{version}/core.css">
    <script type="module" src="https://pyscript.net/releases/{version}/core.js"></script>

    <!-- App CSS Styles -->
    <link rel="stylesheet" href="{stylesheet}">
</head>
<body>
  <script type="mpy" src="./main.py" config="./pyscript.toml"></script>
</body>
</html>
"#,
        version = pyscript_version,
        stylesheet = stylesheet,
    )
}

/// `# Title ####...` padded to the banner width
pub fn banner(title: &str) -> String {
    let head = format!("# {} ", title);
    let pad = BANNER_WIDTH.saturating_sub(head.chars().count());
    format!("{}{}", head, "#".repeat(pad))
}

pub fn main_py(datastore: &str, code: &str, app: &str) -> String {
    let sections = [
        IMPORTS.trim_end().to_string(),
        banner("Datastore"),
        datastore.trim_end().to_string(),
        banner("Code"),
        code.trim_end().to_string(),
        banner("User Interface"),
        app.trim_end().to_string(),
        banner("GO!"),
        "invent.go()".to_string(),
    ];
    let mut out = sections.join("\n\n");
    out.push('\n');
    out
}

pub fn pyscript_toml(invent_src: &str) -> String {
    let mut out = String::from("[files]\n#\n# Invent.\n#\n");
    out.push_str(&format!("\"{{INVENT}}\" = \"{}\"\n", invent_src));
    out.push_str("\"{INVENT_TO}\" = \"./invent\"\n");
    for file in INVENT_FILES {
        out.push_str(&format!("\"{{INVENT}}/{file}\"=\"{{INVENT_TO}}/{file}\"\n", file = file));
    }
    out
}

/// An app with no pages, used when the project has no UI file
pub fn empty_app(name: &str) -> String {
    format!("App(\n    name={},\n    content=[\n    ],\n)\n", python_str(name))
}

/// Single-quoted Python string literal
fn python_str(value: &str) -> String {
    let escaped = value.replace('\\', "\\\\").replace('\'', "\\'").replace('\n', "\\n");
    format!("'{}'", escaped)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_banner_width() {
        let line = banner("Datastore");
        assert!(line.starts_with("# Datastore #"));
        assert_eq!(line.len(), 88);
    }

    #[test]
    fn test_pyscript_toml_maps_every_file() {
        let toml = pyscript_toml(HOSTED_INVENT_SRC);

        assert!(toml.starts_with("[files]\n"));
        assert!(toml.contains(&format!("\"{{INVENT}}\" = \"{}\"\n", HOSTED_INVENT_SRC)));
        assert!(toml.contains("\"{INVENT}/ui/widgets/textinput.py\"=\"{INVENT_TO}/ui/widgets/textinput.py\"\n"));
        assert_eq!(toml.lines().filter(|l| l.starts_with("\"{INVENT}/")).count(), INVENT_FILES.len());
    }

    #[test]
    fn test_main_py_sections_in_order() {
        let main = main_py("invent.datastore.setdefault(\"honks\", 0)\n", "invent.say()\n", &empty_app("Goose"));

        let order: Vec<usize> = ["import invent", "# Datastore", "setdefault", "# Code", "invent.say()", "# User Interface", "App(", "# GO!", "invent.go()"]
            .iter()
            .map(|needle| main.find(needle).unwrap())
            .collect();
        assert!(order.windows(2).all(|w| w[0] < w[1]));
        assert!(main.ends_with("invent.go()\n"));
    }

    #[test]
    fn test_empty_app_quotes_name() {
        assert_eq!(
            empty_app("Gary's app"),
            "App(\n    name='Gary\\'s app',\n    content=[\n    ],\n)\n"
        );
    }

    #[test]
    fn test_index_html_pins_versions() {
        let html = index_html("2024.1.1", "style.css");
        assert!(html.contains("https://pyscript.net/releases/2024.1.1/core.js"));
        assert!(html.contains("<link rel=\"stylesheet\" href=\"style.css\">"));
        assert!(html.contains("config=\"./pyscript.toml\""));
    }
}
