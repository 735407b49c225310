use parry2d::na::{Isometry2, Point2, Vector2};
use parry2d::query;
use parry2d::query::Contact;
use parry2d::shape::{Ball, Cuboid};

pub type Pos2 = Point2<f32>;
pub type Vec2 = Vector2<f32>;

/// max object distance to report a contact; only touching or penetrating shapes count
const CONTACT_PREDICTION: f32 = 0.0;

/// Axis-aligned Bounding Box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AaBB {
    pub min: Pos2,
    pub max: Pos2,
}

impl AaBB {
    pub fn from_corner(left_x: f32, top_y: f32, width: f32, height: f32) -> Self {
        AaBB {
            min: Pos2::new(left_x, top_y),
            max: Pos2::new(left_x + width, top_y + height),
        }
    }

    pub fn center(&self) -> Pos2 {
        Pos2::new(
            (self.min.x + self.max.x) / 2.0,
            (self.min.y + self.max.y) / 2.0,
        )
    }

    pub fn width(&self) -> f32 { self.max.x - self.min.x }

    pub fn height(&self) -> f32 { self.max.y - self.min.y }

    pub fn translate(&self, value: Vec2) -> Self {
        AaBB {
            min: self.min + value,
            max: self.max + value,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circle {
    pub center: Pos2,
    pub radius: f32,
}

/// The face of a rectangle a circle has hit
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ContactFace {
    /// left or right face
    Side,
    /// top or bottom face (also taken for exact corner hits)
    Cap,
}

impl ContactFace {
    pub fn of(surface_normal: Vec2) -> Self {
        if surface_normal.x.abs() > surface_normal.y.abs() {
            ContactFace::Side
        } else {
            ContactFace::Cap
        }
    }
}

/// Outward surface normal of the rectangle at the contact point (pointing towards the circle)
pub fn surface_normal(contact: &Contact) -> Vec2 {
    Vec2::new(contact.normal2.x, contact.normal2.y)
}

/// Returns `value` with its sign pointing along `normal_component`;
/// a plain inversion if the normal has no say in that axis.
pub fn reflect_away(value: f32, normal_component: f32) -> f32 {
    if normal_component == 0.0 {
        -value
    } else {
        normal_component.signum() * value.abs()
    }
}

pub fn contact_test_circle_aabb(circle: &Circle, aabb: &AaBB) -> Option<Contact> {
    let aabb_center = aabb.center();
    query::contact(
        &Isometry2::translation(circle.center.x, circle.center.y),
        &Ball::new(circle.radius),
        &Isometry2::translation(aabb_center.x, aabb_center.y),
        &Cuboid::new(Vector2::new(
            aabb.width() / 2.0,
            aabb.height() / 2.0,
        )),
        CONTACT_PREDICTION,
    )
        .unwrap_or_else(|e| {
            log::warn!("contact calculation failed: {e:?}");
            None
        })
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    #[rstest]
    #[case(Pos2::new(50.0, 36.0), Some(ContactFace::Cap), 1.0)]
    #[case(Pos2::new(50.0, 4.0), Some(ContactFace::Cap), - 1.0)]
    #[case(Pos2::new(4.0, 20.0), Some(ContactFace::Side), 0.0)]
    #[case(Pos2::new(50.0, 60.0), None, 0.0)]
    fn test_contact_circle_aabb(
        #[case] center: Pos2,
        #[case] expected_face: Option<ContactFace>,
        #[case] expected_normal_y: f32,
    ) {
        let rect = AaBB::from_corner(10.0, 10.0, 80.0, 20.0);
        let circle = Circle { center, radius: 8.0 };

        let contact = contact_test_circle_aabb(&circle, &rect);

        assert_eq!(contact.as_ref().map(|c| ContactFace::of(surface_normal(c))), expected_face);
        if let Some(contact) = contact {
            assert!((surface_normal(&contact).y - expected_normal_y).abs() < 0.01);
            assert!(contact.dist <= 0.0);
        }
    }

    #[rstest]
    #[case(4.0, 1.0, 4.0)]
    #[case(- 4.0, 1.0, 4.0)]
    #[case(4.0, - 1.0, - 4.0)]
    #[case(4.0, 0.0, - 4.0)]
    fn test_reflect_away(#[case] value: f32, #[case] normal_component: f32, #[case] expected: f32) {
        assert_eq!(reflect_away(value, normal_component), expected);
    }

    #[test]
    fn test_aabb_geometry() {
        let rect = AaBB::from_corner(10.0, 20.0, 100.0, 12.0);
        assert_eq!(rect.center(), Pos2::new(60.0, 26.0));
        assert_eq!(rect.width(), 100.0);
        assert_eq!(rect.height(), 12.0);
        assert_eq!(rect.translate(Vec2::new(-10.0, 0.0)).min, Pos2::new(0.0, 20.0));
    }
}
