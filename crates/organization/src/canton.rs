use serde::{Deserialize, Serialize};

/// Swiss canton owning a domain of influence tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Canton {
    Ag,
    Ai,
    Ar,
    Be,
    Bl,
    Bs,
    Fr,
    Ge,
    Gl,
    Gr,
    Ju,
    Lu,
    Ne,
    Nw,
    Ow,
    Sg,
    Sh,
    So,
    Sz,
    Tg,
    Ti,
    Ur,
    Vd,
    Vs,
    Zg,
    Zh,
}
