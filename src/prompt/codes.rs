//! Built-in single-letter expansion codes.
use std::collections::BTreeMap;
use std::rc::Rc;

use crate::colors::Theme;
use crate::env::{VarLookup, SHLVL};
use crate::prompt::{sysinfo, Expansion, Flavor};

/// Codes that consumers may not register or remove.
pub const RESERVED: &str = "INDRGYBMCWrgybmcwnhudLtT";

const THEME_CODES: [(char, &str); 17] = [
    ('I', "bright"),
    ('N', "normal"),
    ('D', "default"),
    ('R', "bright_red"),
    ('G', "bright_green"),
    ('Y', "bright_yellow"),
    ('B', "bright_blue"),
    ('M', "bright_magenta"),
    ('C', "bright_cyan"),
    ('W', "bright_white"),
    ('r', "red"),
    ('g', "green"),
    ('y', "yellow"),
    ('b', "blue"),
    ('m', "magenta"),
    ('c', "cyan"),
    ('w', "white"),
];

pub type CodeTable = BTreeMap<char, Expansion>;

pub fn is_reserved(code: char) -> bool {
    RESERVED.contains(code)
}

pub fn reserved(theme: &Theme, flavor: Flavor) -> CodeTable {
    let mut table = CodeTable::new();
    for (code, slot) in THEME_CODES {
        table.insert(code, Expansion::Literal(flavor.wrap(&theme.sequence(slot))));
    }
    table.insert('n', Expansion::Literal("\n".to_string()));
    table.insert('h', Expansion::Lazy(Rc::new(sysinfo::hostname)));
    table.insert('u', Expansion::Lazy(Rc::new(sysinfo::username)));
    table.insert('d', Expansion::Live(Rc::new(|_: &dyn VarLookup| sysinfo::cwd())));
    table.insert(
        'L',
        Expansion::Live(Rc::new(|vars: &dyn VarLookup| {
            vars.lookup(SHLVL).unwrap_or_default()
        })),
    );
    table.insert(
        't',
        Expansion::Live(Rc::new(|_: &dyn VarLookup| sysinfo::local_time("%H:%M:%S"))),
    );
    table.insert(
        'T',
        Expansion::Live(Rc::new(|_: &dyn VarLookup| sysinfo::local_time("%m/%d/%Y"))),
    );
    table
}
