//! BVH queries checked against a linear scan.

use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use rayon::prelude::*;
use tessera_renderer::{Aabb, Bvh, HitRecord, Hittable, Interval, Ray, Sphere, Vec3};

fn linear_scan<'a, H: Hittable>(items: &'a [H], ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
    let mut closest = ray_t.max;
    let mut best = None;
    for item in items {
        if let Some(rec) = item.hit(ray, Interval::new(ray_t.min, closest)) {
            closest = rec.t;
            best = Some(rec);
        }
    }
    best
}

fn vec3() -> impl Strategy<Value = Vec3> {
    (-20.0_f32..20.0, -20.0_f32..20.0, -20.0_f32..20.0).prop_map(|(x, y, z)| Vec3::new(x, y, z))
}

fn sphere() -> impl Strategy<Value = Sphere> {
    (vec3(), 0.1_f32..4.0).prop_map(|(center, radius)| Sphere::new(center, radius))
}

proptest! {
    #[test]
    fn bvh_hit_matches_linear_scan(
        spheres in prop::collection::vec(sphere(), 0..64),
        origin in vec3(),
        target in vec3(),
    ) {
        let dir = target - origin;
        prop_assume!(dir.length() > 1e-3);
        let ray = Ray::new(origin, dir);
        let window = Interval::new(0.001, f32::INFINITY);

        let bvh = Bvh::new(spheres.clone());
        let expected = linear_scan(&spheres, &ray, window);
        let actual = bvh.hit(&ray, window);

        prop_assert_eq!(expected.is_some(), actual.is_some());
        if let (Some(e), Some(a)) = (expected, actual) {
            prop_assert!((e.t - a.t).abs() <= 1e-5 * e.t.max(1.0));
        }
    }

    #[test]
    fn bvh_bbox_is_union(spheres in prop::collection::vec(sphere(), 1..64)) {
        let union = spheres
            .iter()
            .fold(Aabb::EMPTY, |acc, s| Aabb::surrounding(&acc, &s.bounding_box()));
        let bvh = Bvh::new(spheres);
        prop_assert_eq!(bvh.bounding_box(), union);
    }
}

/// Occupies space in the tree but can never be hit.
struct Sentinel {
    bbox: Aabb,
}

impl Hittable for Sentinel {
    fn hit<'a>(&'a self, _ray: &Ray, _ray_t: Interval) -> Option<HitRecord<'a>> {
        None
    }

    fn bounding_box(&self) -> Aabb {
        self.bbox
    }
}

enum Item {
    Real(Sphere),
    Sentinel(Sentinel),
}

impl Hittable for Item {
    fn hit<'a>(&'a self, ray: &Ray, ray_t: Interval) -> Option<HitRecord<'a>> {
        match self {
            Item::Real(s) => s.hit(ray, ray_t),
            Item::Sentinel(s) => s.hit(ray, ray_t),
        }
    }

    fn bounding_box(&self) -> Aabb {
        match self {
            Item::Real(s) => s.bounding_box(),
            Item::Sentinel(s) => s.bounding_box(),
        }
    }
}

fn random_point(rng: &mut StdRng, extent: f32) -> Vec3 {
    Vec3::new(
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
        rng.gen_range(-extent..extent),
    )
}

#[test]
fn bvh_never_reports_sentinels() {
    const REAL: usize = 10_000;
    const RAYS: usize = 1_000_000;
    const CHUNK: usize = 10_000;

    let mut rng = StdRng::seed_from_u64(2024);
    let mut items = Vec::with_capacity(2 * REAL);
    for _ in 0..REAL {
        let center = random_point(&mut rng, 50.0);
        items.push(Item::Real(Sphere::new(center, rng.gen_range(0.2..1.5))));
    }
    for _ in 0..REAL {
        let center = random_point(&mut rng, 50.0);
        let half = Vec3::splat(rng.gen_range(0.2..1.5));
        items.push(Item::Sentinel(Sentinel {
            bbox: Aabb::from_points(center - half, center + half),
        }));
    }
    let bvh = Bvh::new(items);

    let hits: usize = (0..RAYS / CHUNK)
        .into_par_iter()
        .map(|chunk| {
            let mut rng = StdRng::seed_from_u64(chunk as u64);
            let mut hits = 0;
            for _ in 0..CHUNK {
                let origin = random_point(&mut rng, 60.0);
                let target = random_point(&mut rng, 50.0);
                let ray = Ray::new(origin, target - origin);
                if let Some((index, rec)) = bvh.hit_item(&ray, Interval::new(0.001, f32::INFINITY)) {
                    assert!(index < REAL, "sentinel {index} reported as hit");
                    assert!(rec.t.is_finite());
                    hits += 1;
                }
            }
            hits
        })
        .sum();

    // Dense enough that plenty of rays hit something
    assert!(hits > RAYS / 10, "only {hits} hits");
}
