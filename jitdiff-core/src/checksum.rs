//! ChecksumInstrumentation: emits one call per visible primitive
//! path at a checksum site, keyed by a monotonically increasing site id
//! minted once per instrumentation point and never reused.

use crate::tree::{Expr, LValueInfo, Stmt};

#[derive(Debug, Default)]
pub struct SiteIdGen {
    next: u32,
}

impl SiteIdGen {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn next_id(&mut self) -> String {
        let id = format!("c_{}", self.next);
        self.next += 1;
        id
    }
}

/// One `ExprStmt(ChecksumSite ..)` per distinct primitive-typed path,
/// in the order `paths` was handed to us (callers sort/dedup beforehand
/// if a stable ordering matters).
pub fn build_checksum_statements(sites: &mut SiteIdGen, paths: &[LValueInfo]) -> Vec<Stmt> {
    paths
        .iter()
        .filter(|lv| lv.ty.is_primitive())
        .map(|lv| {
            let site_id = sites.next_id();
            Stmt::ExprStmt(Expr::ChecksumSite { site_id, value: Box::new(Expr::Var(lv.path.clone())) })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tree::{FuzzType, PrimitiveKind, VarPath};

    fn lv(name: &str, ty: FuzzType) -> LValueInfo {
        LValueInfo { path: VarPath::root(name), ty, ref_escape_scope: 0, read_only: false, is_ref_root: false }
    }

    #[test]
    fn site_ids_are_monotonic_and_unique() {
        let mut gen = SiteIdGen::new();
        let ids: Vec<String> = (0..5).map(|_| gen.next_id()).collect();
        let mut sorted = ids.clone();
        sorted.sort();
        sorted.dedup();
        assert_eq!(ids.len(), sorted.len());
        assert_eq!(ids[0], "c_0");
        assert_eq!(ids[4], "c_4");
    }

    #[test]
    fn non_primitive_paths_are_skipped() {
        let mut sites = SiteIdGen::new();
        let paths = vec![
            lv("a", FuzzType::Primitive(PrimitiveKind::Int)),
            lv("b", FuzzType::Aggregate(0)),
        ];
        let stmts = build_checksum_statements(&mut sites, &paths);
        assert_eq!(stmts.len(), 1);
    }
}
