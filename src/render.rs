use crate::crawler::UrlNode;

/// Draws the tree with box characters, one URL per line
pub fn render_tree(root: &UrlNode) -> String {
    let mut out = String::from(".\n");
    render_branch(&mut out, std::slice::from_ref(root), "");
    out
}

fn render_branch(out: &mut String, nodes: &[UrlNode], prefix: &str) {
    for (i, node) in nodes.iter().enumerate() {
        let last = i + 1 == nodes.len();
        out.push_str(prefix);
        out.push_str(if last { "└── " } else { "├── " });
        out.push_str(&node.url);
        out.push('\n');

        let child_prefix = format!("{}{}", prefix, if last { "    " } else { "│   " });
        render_branch(out, &node.links, &child_prefix);
    }
}
